use super::{document, ServerRecord};
use crate::error::{ManagerError, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

/// The in-memory set of server records backed by one config file.
pub struct ConfigStore {
    path: PathBuf,
    backup_dir: PathBuf,
    records: Vec<ServerRecord>,
}

impl ConfigStore {
    pub fn with_paths(path: PathBuf, backup_dir: PathBuf) -> Self {
        Self {
            path,
            backup_dir,
            records: Vec::new(),
        }
    }

    #[allow(dead_code)]
    pub fn open(path: PathBuf, backup_dir: PathBuf) -> Result<Self> {
        let mut store = Self::with_paths(path, backup_dir);
        store.reload()?;
        Ok(store)
    }

    pub fn reload(&mut self) -> Result<()> {
        self.records = load(&self.path)?;
        Ok(())
    }

    /// Persist all records; returns the backup taken of the previous file.
    pub fn save(&self) -> Result<Option<PathBuf>> {
        save(&self.path, &self.backup_dir, &self.records)
    }

    pub fn backup(&self) -> Result<Option<PathBuf>> {
        backup(&self.path, &self.backup_dir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn records(&self) -> &[ServerRecord] {
        &self.records
    }

    pub fn get(&self, name: &str) -> Option<&ServerRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn active_count(&self) -> usize {
        self.records.iter().filter(|r| r.active).count()
    }

    /// Insert a record, or replace the one with the same name in place.
    /// Returns true if an existing record was replaced.
    pub fn upsert(&mut self, record: ServerRecord) -> Result<bool> {
        record.validate()?;
        match self.records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => {
                *existing = record;
                Ok(true)
            }
            None => {
                self.records.push(record);
                Ok(false)
            }
        }
    }

    /// Returns the removed record; absent names are a no-op.
    pub fn remove(&mut self, name: &str) -> Option<ServerRecord> {
        let index = self.records.iter().position(|r| r.name == name)?;
        Some(self.records.remove(index))
    }

    pub fn set_active(&mut self, name: &str, active: bool) -> Result<()> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| ManagerError::server_not_found(name))?;
        record.active = active;
        Ok(())
    }

    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        if new.trim().is_empty() {
            return Err(ManagerError::Validation(
                "Server name must not be empty".to_string(),
            ));
        }
        if old == new {
            return if self.contains(old) {
                Ok(())
            } else {
                Err(ManagerError::server_not_found(old))
            };
        }
        if self.contains(new) {
            return Err(ManagerError::Validation(format!(
                "Server '{}' already exists",
                new
            )));
        }
        let record = self
            .records
            .iter_mut()
            .find(|r| r.name == old)
            .ok_or_else(|| ManagerError::server_not_found(old))?;
        record.name = new.to_string();
        Ok(())
    }
}

/// Read all records from `path`. A missing file is an empty config.
pub fn load(path: &Path) -> Result<Vec<ServerRecord>> {
    if !path.exists() {
        tracing::debug!("Config {:?} does not exist yet", path);
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| ManagerError::io(path, e))?;
    let records = document::decode(&contents)?;
    tracing::debug!("Loaded {} servers from {:?}", records.len(), path);
    Ok(records)
}

/// Back up the current file, then atomically write `records` to `path`.
pub fn save(path: &Path, backup_dir: &Path, records: &[ServerRecord]) -> Result<Option<PathBuf>> {
    let mut names = HashSet::new();
    for record in records {
        record.validate()?;
        if !names.insert(record.name.as_str()) {
            return Err(ManagerError::Validation(format!(
                "Duplicate server name '{}'",
                record.name
            )));
        }
    }

    let backup_path = backup(path, backup_dir)?;

    // Claude Desktop's own settings live in the same file
    let root = if path.exists() {
        let contents = std::fs::read_to_string(path).map_err(|e| ManagerError::io(path, e))?;
        document::parse_root(&contents).unwrap_or_else(|e| {
            tracing::warn!("Existing config is unreadable, rewriting it: {}", e);
            Default::default()
        })
    } else {
        Default::default()
    };

    let root = document::encode(root, records);
    let contents = serde_json::to_string_pretty(&root)
        .map_err(|e| ManagerError::Parse(format!("Failed to serialize config: {}", e)))?;
    write_atomic(path, &contents)?;

    let active = records.iter().filter(|r| r.active).count();
    tracing::info!(
        "Saved {:?}: {} active, {} paused",
        path,
        active,
        records.len() - active
    );
    Ok(backup_path)
}

/// Copy `path` into `backup_dir` under a timestamped name.
/// Returns `None` when there is nothing to back up.
pub fn backup(path: &Path, backup_dir: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    std::fs::create_dir_all(backup_dir).map_err(|e| ManagerError::io(backup_dir, e))?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config".to_string());
    let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ");

    let mut backup_path = backup_dir.join(format!("{}_backup_{}.json", stem, timestamp));
    let mut attempt = 1;
    while backup_path.exists() {
        backup_path = backup_dir.join(format!("{}_backup_{}-{}.json", stem, timestamp, attempt));
        attempt += 1;
    }

    std::fs::copy(path, &backup_path).map_err(|e| ManagerError::io(&backup_path, e))?;
    tracing::info!("Backup created: {:?}", backup_path);
    Ok(Some(backup_path))
}

/// Write via a sibling temp file and rename, so readers never see a partial file.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ManagerError::io(parent, e))?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = std::fs::File::create(&tmp_path)
        .and_then(|mut file| {
            file.write_all(contents.as_bytes())?;
            file.sync_all()
        })
        .and_then(|_| std::fs::rename(&tmp_path, path));

    if let Err(e) = result {
        if tmp_path.is_file() {
            let _ = std::fs::remove_file(&tmp_path);
        }
        return Err(ManagerError::io(path, e));
    }
    Ok(())
}
