use crate::error::Result;
use crate::marketplace::CatalogVersion;
use async_trait::async_trait;
use std::path::Path;

/// Where the marketplace catalog and its version token come from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the version token of the remote catalog
    async fn fetch_version(&self) -> Result<CatalogVersion>;

    /// Write the remote catalog database to `dest`, returning the byte count
    async fn download(&self, dest: &Path) -> Result<u64>;
}
