use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManagerError {
    /// Persisted JSON or the cached catalog could not be understood
    #[error("Parse error: {0}")]
    Parse(String),

    /// Bad user input: empty name/command, collisions without confirmation
    #[error("{0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    /// Embedded JSON inside a catalog entry, or a malformed version token
    #[error("Format error: {0}")]
    Format(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ManagerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn server_not_found(name: &str) -> Self {
        Self::Validation(format!("Server '{}' not found", name))
    }
}

impl From<rusqlite::Error> for ManagerError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Parse(format!("catalog database: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, ManagerError>;
