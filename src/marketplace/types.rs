use crate::config::ServerRecord;
use crate::error::{ManagerError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A server template from the marketplace catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketplaceEntry {
    pub name: String,
    pub description: String,
    pub instructions: String,
    pub owner_name: String,
    pub owner_link: String,
    pub repo_link: String,
    pub command: String,
    /// JSON-encoded list of strings
    pub args: String,
    /// JSON-encoded string-to-string object
    pub env_vars: String,
    pub date_added: Option<String>,
}

impl MarketplaceEntry {
    #[allow(dead_code)]
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instructions: String::new(),
            owner_name: String::new(),
            owner_link: String::new(),
            repo_link: String::new(),
            command: command.into(),
            args: "[]".to_string(),
            env_vars: "{}".to_string(),
            date_added: None,
        }
    }

    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }

    pub fn decoded_args(&self) -> Result<Vec<String>> {
        decode_json(&self.name, "args", &self.args, "a JSON list of strings")
    }

    pub fn decoded_env(&self) -> Result<BTreeMap<String, String>> {
        decode_json(
            &self.name,
            "env_vars",
            &self.env_vars,
            "a JSON object of string values",
        )
    }

    /// Build an active server record from this template.
    pub fn to_server_record(&self) -> Result<ServerRecord> {
        if self.command.trim().is_empty() {
            return Err(ManagerError::Format(format!(
                "Marketplace server '{}' has no command",
                self.name
            )));
        }
        let args = self.decoded_args()?;
        let env = self.decoded_env()?;
        let record = ServerRecord::new(self.name.clone(), self.command.clone())
            .with_args(args)
            .with_env(env);
        record.validate()?;
        Ok(record)
    }
}

fn decode_json<T: serde::de::DeserializeOwned + Default>(
    name: &str,
    field: &str,
    raw: &str,
    expected: &str,
) -> Result<T> {
    if raw.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(raw).map_err(|e| {
        ManagerError::Format(format!(
            "Could not parse '{}' for '{}': {}. Expected {}.",
            field, name, e, expected
        ))
    })
}

/// Version token of a catalog. Only equality is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CatalogVersion(String);

impl CatalogVersion {
    /// Accept a trimmed single-word token such as `1.0.3`, `v2` or `2024-06-01`.
    pub fn parse(raw: &str) -> Result<Self> {
        let token = raw.trim();
        if token.is_empty() {
            return Err(ManagerError::Format("version token is empty".to_string()));
        }
        let allowed = |c: char| !c.is_whitespace() && !c.is_control();
        if token.chars().count() > 64 || !token.chars().all(allowed) {
            return Err(ManagerError::Format(format!(
                "expected a bare version token, got {:?}",
                truncate(token, 40)
            )));
        }
        Ok(Self(token.to_string()))
    }

    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CatalogVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportOutcome {
    Created,
    /// A server with this name exists; nothing was changed
    NeedsConfirmation,
    /// The existing server was overwritten after confirmation
    Replaced,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(args: &str, env_vars: &str) -> MarketplaceEntry {
        MarketplaceEntry {
            args: args.to_string(),
            env_vars: env_vars.to_string(),
            ..MarketplaceEntry::new("sqlite", "uvx")
        }
    }

    #[test]
    fn test_to_server_record() {
        let record = entry(
            r#"["mcp-server-sqlite", "--db-path", "~/test.db"]"#,
            r#"{"SQLITE_TIMEOUT": "30"}"#,
        )
        .to_server_record()
        .unwrap();

        assert_eq!(record.name, "sqlite");
        assert_eq!(record.command, "uvx");
        assert_eq!(record.args, vec!["mcp-server-sqlite", "--db-path", "~/test.db"]);
        assert_eq!(record.env.get("SQLITE_TIMEOUT").unwrap(), "30");
        assert!(record.active);
    }

    #[test]
    fn test_empty_json_text_means_no_args() {
        let record = entry("", "  ").to_server_record().unwrap();
        assert!(record.args.is_empty());
        assert!(record.env.is_empty());
    }

    #[test]
    fn test_malformed_entries_are_format_errors() {
        let cases = [
            ("[\"unterminated", "{}"),
            ("{\"a\": 1}", "{}"),
            ("[1, 2]", "{}"),
            ("\"just a string\"", "{}"),
            ("[]", "{\"KEY\": 5}"),
            ("[]", "[\"KEY=VALUE\"]"),
            ("[]", "{oops}"),
            ("null", "{}"),
        ];
        for (args, env_vars) in cases {
            let result = entry(args, env_vars).to_server_record();
            assert!(
                matches!(result, Err(ManagerError::Format(_))),
                "args={args} env={env_vars} gave {result:?}"
            );
        }
    }

    #[test]
    fn test_missing_command_is_format_error() {
        let mut e = entry("[]", "{}");
        e.command = String::new();
        assert!(matches!(e.to_server_record(), Err(ManagerError::Format(_))));
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let mut e = MarketplaceEntry::new("Brave-Search", "npx");
        e.description = "Web search via the Brave API".to_string();
        assert!(e.matches("brave"));
        assert!(e.matches("WEB SEARCH"));
        assert!(!e.matches("sqlite"));
    }

    #[test]
    fn test_catalog_version_parse() {
        assert_eq!(CatalogVersion::parse(" 1.0.1\n").unwrap().as_str(), "1.0.1");
        assert_eq!(CatalogVersion::parse("2024-06-01").unwrap().as_str(), "2024-06-01");
        assert!(matches!(CatalogVersion::parse(""), Err(ManagerError::Format(_))));
        assert_eq!(CatalogVersion::parse("1.0-β").unwrap().as_str(), "1.0-β");
        assert!(matches!(
            CatalogVersion::parse("<html>\n<body>404 Not Found</body>\n</html>"),
            Err(ManagerError::Format(_))
        ));
        assert!(matches!(
            CatalogVersion::parse("1.0\u{7f}"),
            Err(ManagerError::Format(_))
        ));
        assert!(matches!(
            CatalogVersion::parse(&"9".repeat(65)),
            Err(ManagerError::Format(_))
        ));
        assert!(matches!(
            CatalogVersion::parse("1.0.0\n1.0.1"),
            Err(ManagerError::Format(_))
        ));
    }
}
