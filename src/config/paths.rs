use super::expand_path;
use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Overrides every directory this tool owns (preferences, catalog, backups)
pub const HOME_ENV: &str = "MCP_MANAGER_HOME";
/// Overrides the location of Claude Desktop's config file
pub const CONFIG_ENV: &str = "MCP_MANAGER_CONFIG";

pub const DESKTOP_CONFIG_FILE: &str = "claude_desktop_config.json";

/// Directories owned by mcp-manager itself.
#[derive(Debug, Clone)]
pub struct AppDirs {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AppDirs {
    pub fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "mcp-manager")
            .context("Could not determine config directory")?;
        Ok(Self {
            config_dir: dirs.config_dir().to_path_buf(),
            data_dir: dirs.data_dir().to_path_buf(),
        })
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_dir: root.clone(),
            data_dir: root,
        }
    }

    pub fn from_env() -> Result<Self> {
        match std::env::var_os(HOME_ENV) {
            Some(root) if !root.is_empty() => Ok(Self::with_root(root.into())),
            _ => Self::new(),
        }
    }

    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.data_dir, &self.backup_dir()] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {:?}", dir))?;
        }
        Ok(())
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.config_dir.join("preferences.json")
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("marketplace.db")
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }
}

/// Where Claude Desktop keeps its config on this OS.
pub fn default_desktop_config_path() -> Option<PathBuf> {
    // config_dir is ~/Library/Application Support, %APPDATA% or ~/.config
    BaseDirs::new().map(|dirs| dirs.config_dir().join("Claude").join(DESKTOP_CONFIG_FILE))
}

/// A non-empty custom path wins over OS detection.
pub fn resolve_desktop_config_path(custom: Option<&str>) -> Option<PathBuf> {
    match custom.map(str::trim) {
        Some(custom) if !custom.is_empty() => Some(expand_path(custom)),
        _ => default_desktop_config_path(),
    }
}

pub fn default_executable_paths() -> &'static [&'static str] {
    if cfg!(target_os = "macos") {
        &["/Applications/Claude.app", "~/Applications/Claude.app"]
    } else if cfg!(windows) {
        &[
            r"%LOCALAPPDATA%\AnthropicClaude\Claude.exe",
            r"%LOCALAPPDATA%\Programs\Claude\Claude.exe",
            r"%PROGRAMFILES%\Claude\Claude.exe",
            r"%PROGRAMFILES(X86)%\Claude\Claude.exe",
        ]
    } else {
        &[
            "/usr/bin/claude",
            "/usr/local/bin/claude",
            "~/.local/bin/claude",
            "/opt/Claude/claude",
            "/snap/bin/claude",
        ]
    }
}

/// First existing executable, checking user paths before the defaults.
pub fn find_claude_executable(custom: &[String]) -> Option<PathBuf> {
    custom
        .iter()
        .map(String::as_str)
        .chain(default_executable_paths().iter().copied())
        .map(expand_path)
        .find(|path| path.exists())
}
