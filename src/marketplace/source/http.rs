use super::CatalogSource;
use crate::error::{ManagerError, Result};
use crate::marketplace::CatalogVersion;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

const VERSION_TIMEOUT: Duration = Duration::from_secs(5);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

pub struct HttpCatalogSource {
    client: Client,
    db_url: String,
    version_url: String,
}

impl HttpCatalogSource {
    pub fn new(db_url: String, version_url: String) -> Self {
        Self {
            client: Client::new(),
            db_url,
            version_url,
        }
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .header(
                "User-Agent",
                concat!("mcp-manager/", env!("CARGO_PKG_VERSION")),
            )
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| network_error(url, e))?;

        if !response.status().is_success() {
            return Err(ManagerError::Network(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_version(&self) -> Result<CatalogVersion> {
        tracing::debug!("Fetching remote catalog version from {}", self.version_url);
        let body = self
            .get(&self.version_url, VERSION_TIMEOUT)
            .await?
            .text()
            .await
            .map_err(|e| network_error(&self.version_url, e))?;
        CatalogVersion::parse(&body)
    }

    async fn download(&self, dest: &Path) -> Result<u64> {
        tracing::debug!("Downloading catalog from {} to {:?}", self.db_url, dest);
        let response = self.get(&self.db_url, DOWNLOAD_TIMEOUT).await?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| ManagerError::io(dest, e))?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| network_error(&self.db_url, e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| ManagerError::io(dest, e))?;
            written += chunk.len() as u64;
        }

        file.sync_all().await.map_err(|e| ManagerError::io(dest, e))?;
        Ok(written)
    }
}

fn network_error(url: &str, err: reqwest::Error) -> ManagerError {
    if err.is_timeout() {
        ManagerError::Network(format!("timed out talking to {}", url))
    } else if err.is_connect() {
        ManagerError::Network(format!("could not reach {}: {}", url, err))
    } else {
        ManagerError::Network(format!("request to {} failed: {}", url, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Answer a single HTTP request with a canned response.
    async fn serve_once(status: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let head = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}/", addr)
    }

    async fn closed_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_fetch_version() {
        let url = serve_once("200 OK", b"1.0.1\n").await;
        let source = HttpCatalogSource::new(String::new(), url);
        assert_eq!(source.fetch_version().await.unwrap().as_str(), "1.0.1");
    }

    #[tokio::test]
    async fn test_fetch_version_rejects_html() {
        let url = serve_once("200 OK", b"<!DOCTYPE html><html>moved</html>").await;
        let source = HttpCatalogSource::new(String::new(), url);
        assert!(matches!(
            source.fetch_version().await,
            Err(ManagerError::Format(_))
        ));
    }

    #[tokio::test]
    async fn test_http_error_status_is_network_error() {
        let url = serve_once("404 Not Found", b"404: Not Found").await;
        let source = HttpCatalogSource::new(String::new(), url);
        assert!(matches!(
            source.fetch_version().await,
            Err(ManagerError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let source = HttpCatalogSource::new(closed_url().await, closed_url().await);
        assert!(matches!(
            source.fetch_version().await,
            Err(ManagerError::Network(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("download.db");
        assert!(matches!(
            source.download(&dest).await,
            Err(ManagerError::Network(_))
        ));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_writes_body() {
        let url = serve_once("200 OK", b"SQLite format 3\0fake").await;
        let source = HttpCatalogSource::new(url, String::new());

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("download.db");
        let written = source.download(&dest).await.unwrap();

        assert_eq!(written, 20);
        assert_eq!(std::fs::read(&dest).unwrap(), b"SQLite format 3\0fake");
    }
}
