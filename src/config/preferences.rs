use super::write_atomic;
use crate::error::{ManagerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_MARKETPLACE_DB_URL: &str =
    "https://github.com/dawid-ai/MCP-manager/raw/refs/heads/feat/marketplace-and-version-check/marketplace.db";
pub const DEFAULT_MARKETPLACE_VERSION_URL: &str =
    "https://raw.githubusercontent.com/dawid-ai/MCP-manager/refs/heads/feat/marketplace-and-version-check/marketplace_ver.txt";
pub const DEFAULT_APP_VERSION_URL: &str =
    "https://raw.githubusercontent.com/dawid-ai/MCP-manager/refs/heads/feat/marketplace-and-version-check/mcp_manager_ver.txt";

/// User preferences, persisted as `preferences.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Empty means auto-detect per OS
    pub claude_desktop_config_path: String,
    /// Tried in order before the built-in locations
    pub claude_executable_paths: Vec<String>,
    pub marketplace_db_url: String,
    pub marketplace_version_url: String,
    pub app_version_url: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            claude_desktop_config_path: String::new(),
            claude_executable_paths: Vec::new(),
            marketplace_db_url: DEFAULT_MARKETPLACE_DB_URL.to_string(),
            marketplace_version_url: DEFAULT_MARKETPLACE_VERSION_URL.to_string(),
            app_version_url: DEFAULT_APP_VERSION_URL.to_string(),
        }
    }
}

impl Preferences {
    /// Load preferences, writing the defaults out on first run.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if !path.exists() {
            let prefs = Self::default();
            prefs.save(path)?;
            tracing::debug!("Created default preferences at {:?}", path);
            return Ok(prefs);
        }
        let contents =
            std::fs::read_to_string(path).map_err(|e| ManagerError::io(path, e))?;
        serde_json::from_str(&contents).map_err(|e| {
            ManagerError::Parse(format!("preferences file {:?}: {}", path, e))
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ManagerError::Parse(format!("Failed to serialize preferences: {}", e)))?;
        write_atomic(path, &contents)
    }

    pub fn custom_config_path(&self) -> Option<&str> {
        let path = self.claude_desktop_config_path.trim();
        (!path.is_empty()).then_some(path)
    }

    /// Returns false if the path was already listed.
    pub fn add_executable_path(&mut self, path: String) -> bool {
        if self.claude_executable_paths.contains(&path) {
            return false;
        }
        self.claude_executable_paths.push(path);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");

        let prefs = Preferences::load_or_init(&path).unwrap();
        assert_eq!(prefs, Preferences::default());
        assert!(path.exists());
        assert_eq!(prefs.custom_config_path(), None);
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, r#"{"claude_desktop_config_path": "~/claude.json"}"#).unwrap();

        let prefs = Preferences::load_or_init(&path).unwrap();
        assert_eq!(prefs.custom_config_path(), Some("~/claude.json"));
        assert!(prefs.claude_executable_paths.is_empty());
        assert_eq!(prefs.marketplace_db_url, DEFAULT_MARKETPLACE_DB_URL);
    }

    #[test]
    fn test_malformed_preferences_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{ nope").unwrap();

        assert!(matches!(
            Preferences::load_or_init(&path),
            Err(ManagerError::Parse(_))
        ));
    }

    #[test]
    fn test_add_executable_path_is_ordered_and_unique() {
        let mut prefs = Preferences::default();
        assert!(prefs.add_executable_path("/opt/a".to_string()));
        assert!(prefs.add_executable_path("/opt/b".to_string()));
        assert!(!prefs.add_executable_path("/opt/a".to_string()));
        assert_eq!(prefs.claude_executable_paths, vec!["/opt/a", "/opt/b"]);
    }
}
