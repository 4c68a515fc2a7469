//! WebHDFS client for recordings stored in HDFS.
//!
//! `webhdfs://host:port/path` URIs are read through the namenode REST API
//! (`GET /webhdfs/v1/<path>?op=OPEN`), following the redirect to the datanode
//! that serves the file.

use crate::error::SourceError;
use std::fmt;

/// Namenode HTTP port used when the URI has none.
pub const DEFAULT_NAMENODE_PORT: u16 = 9870;

/// A file on a WebHDFS namenode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebHdfsLocation {
    host: String,
    port: u16,
    path: String,
}

impl WebHdfsLocation {
    /// Parse a `webhdfs://host[:port]/path` URI.
    pub fn parse(uri: &str) -> Result<Self, SourceError> {
        let rest = uri.strip_prefix("webhdfs://").ok_or_else(|| {
            SourceError::Unsupported(format!("{uri}: expected a webhdfs:// URI"))
        })?;

        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };
        if authority.is_empty() || path.len() <= 1 {
            return Err(SourceError::Unsupported(format!(
                "{uri}: webhdfs URI needs a host and a file path"
            )));
        }

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|e| {
                    SourceError::Unsupported(format!("{uri}: invalid port '{port}': {e}"))
                })?;
                (host, port)
            }
            None => (authority, DEFAULT_NAMENODE_PORT),
        };

        Ok(Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Absolute HDFS path of the file.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// REST URL that streams the file contents.
    pub fn open_url(&self, user: Option<&str>) -> String {
        let mut url = format!(
            "http://{}:{}/webhdfs/v1{}?op=OPEN",
            self.host, self.port, self.path
        );
        if let Some(user) = user {
            url.push_str("&user.name=");
            url.push_str(user);
        }
        url
    }
}

impl fmt::Display for WebHdfsLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "webhdfs://{}:{}{}", self.host, self.port, self.path)
    }
}

/// WebHDFS client settings.
#[derive(Debug, Clone)]
pub struct WebHdfsConfig {
    /// Value of the `user.name` query parameter (simple auth)
    pub user: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for WebHdfsConfig {
    fn default() -> Self {
        Self {
            user: std::env::var("HADOOP_USER_NAME").ok(),
            timeout_secs: 30,
        }
    }
}

/// Async WebHDFS reader.
#[cfg(feature = "webhdfs")]
pub struct WebHdfsClient {
    config: WebHdfsConfig,
    client: reqwest::Client,
}

#[cfg(feature = "webhdfs")]
impl WebHdfsClient {
    /// Create a new client.
    pub fn new(config: WebHdfsConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Download the whole file.
    pub async fn read(&self, location: &WebHdfsLocation) -> Result<bytes::Bytes, SourceError> {
        let url = location.open_url(self.config.user.as_deref());
        tracing::debug!(%location, "opening webhdfs file");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SourceError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))
    }
}

/// Blocking WebHDFS reader for synchronous callers.
#[cfg(feature = "webhdfs")]
pub struct BlockingWebHdfsClient {
    inner: WebHdfsClient,
    runtime: tokio::runtime::Runtime,
}

#[cfg(feature = "webhdfs")]
impl BlockingWebHdfsClient {
    /// Create a new blocking client.
    pub fn new(config: WebHdfsConfig) -> Result<Self, SourceError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SourceError::Network(format!("failed to create runtime: {e}")))?;

        Ok(Self {
            inner: WebHdfsClient::new(config)?,
            runtime,
        })
    }

    /// Download the whole file.
    pub fn read(&self, location: &WebHdfsLocation) -> Result<bytes::Bytes, SourceError> {
        self.runtime.block_on(self.inner.read(location))
    }
}
