use super::{CatalogVersion, MarketplaceEntry};
use crate::error::{ManagerError, Result};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::path::{Path, PathBuf};

const ENTRY_COLUMNS: &str = "name, description, instructions, owner_name, owner_link, \
                             repo_link, command, args, env_vars, date_added";

/// Read-only view of the cached marketplace database.
///
/// Layout: `metadata(key, value)` holding the `version` row, and
/// `servers(name, description, ..., command, args, env_vars, date_added)`.
#[derive(Debug, Clone)]
pub struct LocalCatalog {
    path: PathBuf,
}

impl LocalCatalog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// `None` if there is no cache yet, or it carries no version row.
    pub fn version(&self) -> Result<Option<CatalogVersion>> {
        if !self.exists() {
            return Ok(None);
        }
        let conn = open_read_only(&self.path)?;
        let value: Option<Option<String>> = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = 'version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value
            .flatten()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(CatalogVersion::from_stored))
    }

    /// All entries ordered by name, optionally filtered on name/description.
    pub fn list_entries(&self, query: Option<&str>) -> Result<Vec<MarketplaceEntry>> {
        if !self.exists() {
            tracing::debug!("No marketplace cache at {:?}", self.path);
            return Ok(Vec::new());
        }
        let conn = open_read_only(&self.path)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM servers ORDER BY name COLLATE NOCASE",
            ENTRY_COLUMNS
        ))?;
        let rows = stmt.query_map([], row_to_entry)?;

        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let mut entries = Vec::new();
        for row in rows {
            let entry = row??;
            if query.map_or(true, |q| entry.matches(q)) {
                entries.push(entry);
            }
        }
        tracing::debug!("Listed {} marketplace entries (query: {:?})", entries.len(), query);
        Ok(entries)
    }

    pub fn entry(&self, name: &str) -> Result<Option<MarketplaceEntry>> {
        if !self.exists() {
            return Ok(None);
        }
        let conn = open_read_only(&self.path)?;
        let entry = conn
            .query_row(
                &format!("SELECT {} FROM servers WHERE name = ?1", ENTRY_COLUMNS),
                params![name],
                row_to_entry,
            )
            .optional()?;
        entry.transpose()
    }
}

/// Check that `path` is a SQLite file with both catalog tables.
pub fn verify(path: &Path) -> Result<()> {
    let conn = open_read_only(path)?;
    let tables: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('metadata', 'servers')",
        [],
        |row| row.get(0),
    )?;
    if tables != 2 {
        return Err(ManagerError::Parse(
            "downloaded file is not a marketplace catalog (missing tables)".to_string(),
        ));
    }
    Ok(())
}

fn open_read_only(path: &Path) -> Result<Connection> {
    Ok(Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?)
}

// The outer error is SQLite's; the inner one flags a row that breaks the catalog contract.
fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<Result<MarketplaceEntry>> {
    let text = |idx: usize| -> rusqlite::Result<String> {
        Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
    };

    let name = text(0)?;
    let command: Option<String> = row.get(6)?;
    let Some(command) = command else {
        return Ok(Err(ManagerError::Parse(format!(
            "catalog entry '{}' has no command",
            name
        ))));
    };

    Ok(Ok(MarketplaceEntry {
        description: text(1)?,
        instructions: text(2)?,
        owner_name: text(3)?,
        owner_link: text(4)?,
        repo_link: text(5)?,
        command,
        args: text(7)?,
        env_vars: text(8)?,
        date_added: row.get(9)?,
        name,
    }))
}

#[cfg(test)]
pub(crate) fn write_catalog(path: &Path, version: Option<&str>, entries: &[MarketplaceEntry]) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE metadata (key TEXT PRIMARY KEY, value TEXT);
         CREATE TABLE servers (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             name TEXT UNIQUE NOT NULL,
             description TEXT,
             instructions TEXT,
             owner_name TEXT,
             owner_link TEXT,
             repo_link TEXT,
             command TEXT,
             args TEXT,
             env_vars TEXT,
             date_added TEXT
         );",
    )
    .unwrap();
    if let Some(version) = version {
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES ('version', ?1)",
            params![version],
        )
        .unwrap();
    }
    for e in entries {
        conn.execute(
            &format!(
                "INSERT INTO servers ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                ENTRY_COLUMNS
            ),
            params![
                e.name,
                e.description,
                e.instructions,
                e.owner_name,
                e.owner_link,
                e.repo_link,
                e.command,
                e.args,
                e.env_vars,
                e.date_added
            ],
        )
        .unwrap();
    }
}
