use super::catalog::{self, LocalCatalog};
use super::source::CatalogSource;
use super::{CatalogVersion, ImportOutcome, MarketplaceEntry};
use crate::config::ConfigStore;
use crate::error::{ManagerError, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Result of a completed catalog download.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogUpdate {
    pub version: Option<CatalogVersion>,
    pub bytes: u64,
    pub sha256: String,
}

/// Local and remote catalog versions side by side.
#[derive(Debug)]
pub struct CatalogStatus {
    /// `None` when there is no readable cache
    pub local: Option<CatalogVersion>,
    pub remote: Result<CatalogVersion>,
}

impl CatalogStatus {
    /// `None` when the remote version is unknown.
    pub fn update_available(&self) -> Option<bool> {
        self.remote
            .as_ref()
            .ok()
            .map(|remote| update_available(self.local.as_ref(), remote))
    }
}

/// Keeps the local marketplace cache in step with its remote source.
pub struct MarketplaceSync<S> {
    source: S,
    catalog: LocalCatalog,
}

impl<S: CatalogSource> MarketplaceSync<S> {
    pub fn new(source: S, cache_path: PathBuf) -> Self {
        Self {
            source,
            catalog: LocalCatalog::new(cache_path),
        }
    }

    pub fn catalog(&self) -> &LocalCatalog {
        &self.catalog
    }

    pub async fn fetch_remote_version(&self) -> Result<CatalogVersion> {
        self.source.fetch_version().await
    }

    pub fn local_version(&self) -> Result<Option<CatalogVersion>> {
        self.catalog.version()
    }

    pub async fn is_update_available(&self) -> Result<bool> {
        let remote = self.fetch_remote_version().await?;
        let local = self.readable_local_version();
        tracing::debug!("Catalog versions - local: {:?}, remote: {}", local, remote);
        Ok(update_available(local.as_ref(), &remote))
    }

    /// Both versions at once. A remote failure is kept rather than returned.
    pub async fn status(&self) -> CatalogStatus {
        let local = self.readable_local_version();
        let remote = self.fetch_remote_version().await;
        CatalogStatus { local, remote }
    }

    fn readable_local_version(&self) -> Option<CatalogVersion> {
        self.local_version().unwrap_or_else(|e| {
            tracing::warn!("Local catalog is unreadable, treating it as missing: {}", e);
            None
        })
    }

    /// Download the remote catalog and swap it in.
    ///
    /// The download lands in a temp file next to the cache and only replaces
    /// it once it has been fully written and opens as a catalog. Dropping the
    /// returned future deletes the partial download.
    pub async fn update_catalog(&self) -> Result<CatalogUpdate> {
        let cache_path = self.catalog.path();
        let dir = cache_dir(cache_path);
        std::fs::create_dir_all(&dir).map_err(|e| ManagerError::io(&dir, e))?;

        let tmp = tempfile::Builder::new()
            .prefix(".marketplace-")
            .suffix(".download")
            .tempfile_in(&dir)
            .map_err(|e| ManagerError::io(&dir, e))?;

        let bytes = self.source.download(tmp.path()).await?;
        catalog::verify(tmp.path())?;

        let sha256 = file_sha256(tmp.path())?;

        tmp.persist(cache_path)
            .map_err(|e| ManagerError::io(cache_path, e.error))?;

        let version = self.local_version()?;
        tracing::info!(
            "Marketplace catalog updated to {} ({} bytes)",
            version.as_ref().map_or("<unversioned>", |v| v.as_str()),
            bytes
        );
        Ok(CatalogUpdate {
            version,
            bytes,
            sha256,
        })
    }

    pub fn list_entries(&self, query: Option<&str>) -> Result<Vec<MarketplaceEntry>> {
        self.catalog.list_entries(query)
    }

    pub fn entry(&self, name: &str) -> Result<Option<MarketplaceEntry>> {
        self.catalog.entry(name)
    }
}

/// Any difference between the two tokens, or no local copy, means an update.
pub fn update_available(local: Option<&CatalogVersion>, remote: &CatalogVersion) -> bool {
    local != Some(remote)
}

/// Add `entry` to the store unless a server with that name already exists.
pub fn import_entry(entry: &MarketplaceEntry, store: &mut ConfigStore) -> Result<ImportOutcome> {
    let record = entry.to_server_record()?;
    if store.contains(&record.name) {
        tracing::debug!("Import of '{}' needs confirmation", record.name);
        return Ok(ImportOutcome::NeedsConfirmation);
    }
    store.upsert(record)?;
    Ok(ImportOutcome::Created)
}

/// Import after the user agreed to overwrite; the result is always active.
pub fn confirm_import(entry: &MarketplaceEntry, store: &mut ConfigStore) -> Result<ImportOutcome> {
    let record = entry.to_server_record()?;
    if store.upsert(record)? {
        Ok(ImportOutcome::Replaced)
    } else {
        Ok(ImportOutcome::Created)
    }
}

fn file_sha256(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).map_err(|e| ManagerError::io(path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| ManagerError::io(path, e))?;
    Ok(format!("{:x}", hasher.finalize()))
}

fn cache_dir(cache_path: &Path) -> PathBuf {
    match cache_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
