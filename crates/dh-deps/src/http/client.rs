//! HTTP client for fetching dependency archives.
//!
//! A thin wrapper around `reqwest` that streams response bodies to disk and
//! reports progress as it goes. Failed requests are not retried: a broken
//! download aborts the run and the user re-runs setup.
//!
//! # Examples
//!
//! ```no_run
//! use dh_deps::http::HttpClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//!
//! let written = client.download(
//!     "https://example.com/files/glm/linux/glm_0.9.8.3_release_gcc6.tar.gz",
//!     "deps/glm_0.9.8.3_release_gcc6.tar.gz".as_ref(),
//!     Some(|downloaded: u64, total: Option<u64>| {
//!         println!("Read {} / {:?} bytes", downloaded, total);
//!     }),
//! ).await?;
//! # Ok(())
//! # }
//! ```

use futures_util::StreamExt;
use reqwest::{Client, Response};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

const DEFAULT_USER_AGENT: &str = concat!("dh-setup/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent);

        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            user_agent: config.user_agent,
        })
    }

    /// Perform a GET request, failing on any non-2xx status
    pub async fn get(&self, url: &str) -> Result<Response, HttpError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }

    /// Stream `url` into `dest`, returning the number of bytes written
    ///
    /// `dest` is created or truncated. The progress callback receives the
    /// cumulative byte count after every chunk, plus the `Content-Length`
    /// when the server sent one.
    pub async fn download<F>(
        &self,
        url: &str,
        dest: &Path,
        mut progress: Option<F>,
    ) -> Result<u64, HttpError>
    where
        F: FnMut(u64, Option<u64>),
    {
        let response = self.get(url).await?;
        let total_size = response.content_length();

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = File::create(dest).await?;
        let mut downloaded: u64 = 0;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if let Some(ref mut callback) = progress {
                callback(downloaded, total_size);
            }
        }

        file.flush().await?;

        Ok(downloaded)
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub proxy: Option<String>,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            proxy: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpClientConfig {
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }
}
