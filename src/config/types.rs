use crate::error::{ManagerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named subprocess launch specification, as managed by this tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerRecord {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    /// Paused records stay in the file but are hidden from Claude Desktop
    pub active: bool,
}

impl ServerRecord {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            active: true,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env<I, K, V>(mut self, env: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = env.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    #[allow(dead_code)]
    pub fn paused(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ManagerError::Validation(
                "Server name must not be empty".to_string(),
            ));
        }
        if self.command.trim().is_empty() {
            return Err(ManagerError::Validation(format!(
                "Server '{}' needs a command",
                self.name
            )));
        }
        Ok(())
    }

    pub fn status(&self) -> &'static str {
        if self.active {
            "active"
        } else {
            "paused"
        }
    }

    pub(crate) fn from_spec(name: String, spec: ServerSpec, active: bool) -> Self {
        Self {
            name,
            command: spec.command,
            args: spec.args,
            env: spec.env,
            active,
        }
    }

    pub(crate) fn to_spec(&self) -> ServerSpec {
        ServerSpec {
            command: self.command.clone(),
            args: self.args.clone(),
            env: self.env.clone(),
        }
    }
}

/// The launch spec exactly as it appears in `claude_desktop_config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSpec {
    pub command: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}
