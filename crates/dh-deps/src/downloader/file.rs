//! File downloader for dependency archives.

use std::path::Path;
use std::sync::Arc;

use crate::http::HttpClient;
use crate::{Result, SetupError};

/// Fetches archives over HTTP into the staging directory
pub struct FileDownloader {
    http_client: Arc<HttpClient>,
}

impl FileDownloader {
    /// Create a new file downloader
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self { http_client }
    }

    /// Download `url` to `dest` on behalf of dependency `key`
    ///
    /// Returns the number of bytes written. Any transport failure is
    /// reported as [`SetupError::Network`] naming the dependency and URL.
    pub async fn fetch<F>(
        &self,
        key: &str,
        url: &str,
        dest: &Path,
        progress: Option<F>,
    ) -> Result<u64>
    where
        F: FnMut(u64, Option<u64>),
    {
        log::debug!("Fetching {} from {}", key, url);

        let written = self
            .http_client
            .download(url, dest, progress)
            .await
            .map_err(|e| SetupError::Network {
                key: key.to_string(),
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        log::debug!("Wrote {} bytes to {}", written, dest.display());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = Arc::new(HttpClient::new().unwrap());
        let downloader = FileDownloader::new(client);

        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("glm.tar.gz");

        // Port 9 (discard) on localhost is not listening in test environments
        let result = downloader
            .fetch("glm", "http://127.0.0.1:9/glm.tar.gz", &dest, None::<fn(u64, Option<u64>)>)
            .await;

        match result {
            Err(SetupError::Network { key, url, .. }) => {
                assert_eq!(key, "glm");
                assert_eq!(url, "http://127.0.0.1:9/glm.tar.gz");
            }
            other => panic!("Expected network error, got {:?}", other),
        }
    }
}
