//! Sample sources for the analyzer.
//!
//! A source is a local file or a WebHDFS URI holding a tabular recording.
//! The loader resolves the source, reads its bytes and decodes one numeric
//! column into a flat `Vec<f64>`; the analyzer never sees the table itself.
//!
//! ```text
//!  path / file:// / webhdfs://
//!        │
//!        ▼
//!   ┌──────────────┐
//!   │ SampleSource │  resolve + read bytes
//!   └──────────────┘
//!        │
//!        ▼
//!   ┌──────────────┐
//!   │ decode_column│  parquet | csv → Vec<f64>
//!   └──────────────┘
//! ```

pub mod columnar;
pub mod delimited;
pub mod webhdfs;

use crate::error::SourceError;
use bytes::Bytes;
use std::fmt;
use std::path::{Path, PathBuf};

pub use columnar::write_columns as write_parquet_columns;
pub use webhdfs::WebHdfsLocation;

#[cfg(feature = "webhdfs")]
pub use webhdfs::{BlockingWebHdfsClient, WebHdfsClient};

/// Default name of the vibration column.
pub const DEFAULT_COLUMN: &str = "vibration";

/// File layout of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Parquet,
    Csv,
}

impl SourceFormat {
    /// Detect the format from a path's extension.
    pub fn from_path(path: &str) -> Result<Self, SourceError> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "parquet" | "pq" => Ok(SourceFormat::Parquet),
            "csv" => Ok(SourceFormat::Csv),
            "" => Err(SourceError::Unsupported(format!(
                "{path}: no file extension"
            ))),
            other => Err(SourceError::Unsupported(format!(
                "{path}: unsupported file extension .{other}"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SourceFormat::Parquet => "parquet",
            SourceFormat::Csv => "csv",
        }
    }
}

/// Where a recording lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleSource {
    /// A file on the local filesystem
    Local(PathBuf),
    /// A file served by a WebHDFS namenode
    WebHdfs(WebHdfsLocation),
}

impl SampleSource {
    /// Resolve a path or URI.
    ///
    /// Accepts plain paths, `file://` URIs and `webhdfs://host[:port]/path`.
    pub fn parse(uri: &str) -> Result<Self, SourceError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(SourceError::Unsupported("empty source path".to_string()));
        }

        match uri.split_once("://") {
            None => Ok(SampleSource::Local(PathBuf::from(uri))),
            Some(("file", rest)) => Ok(SampleSource::Local(PathBuf::from(rest))),
            Some(("webhdfs", _)) => Ok(SampleSource::WebHdfs(WebHdfsLocation::parse(uri)?)),
            Some((scheme, _)) => Err(SourceError::Unsupported(format!(
                "{uri}: unsupported scheme '{scheme}'"
            ))),
        }
    }

    /// Format of the recording, from its file extension.
    pub fn format(&self) -> Result<SourceFormat, SourceError> {
        match self {
            SampleSource::Local(path) => SourceFormat::from_path(&path.to_string_lossy()),
            SampleSource::WebHdfs(location) => SourceFormat::from_path(location.path()),
        }
    }

    /// Read the raw bytes of the recording, blocking the current thread.
    pub fn read_bytes(&self) -> Result<Bytes, SourceError> {
        match self {
            SampleSource::Local(path) => read_local(path),
            #[cfg(feature = "webhdfs")]
            SampleSource::WebHdfs(location) => {
                let client = BlockingWebHdfsClient::new(webhdfs::WebHdfsConfig::default())?;
                client.read(location)
            }
            #[cfg(not(feature = "webhdfs"))]
            SampleSource::WebHdfs(_) => Err(SourceError::Unsupported(
                "webhdfs support is not enabled in this build".to_string(),
            )),
        }
    }

    /// Read the raw bytes of the recording without blocking the runtime.
    #[cfg(feature = "webhdfs")]
    pub async fn read_bytes_async(&self, client: &WebHdfsClient) -> Result<Bytes, SourceError> {
        match self {
            SampleSource::Local(path) => {
                let path = path.clone();
                tokio::task::spawn_blocking(move || read_local(&path))
                    .await
                    .map_err(|e| SourceError::Io {
                        path: "<blocking task>".to_string(),
                        message: e.to_string(),
                    })?
            }
            SampleSource::WebHdfs(location) => client.read(location).await,
        }
    }
}

impl fmt::Display for SampleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleSource::Local(path) => write!(f, "{}", path.display()),
            SampleSource::WebHdfs(location) => write!(f, "{location}"),
        }
    }
}

/// Decode `column` from a recording held in memory.
pub fn decode_column(
    bytes: Bytes,
    format: SourceFormat,
    column: &str,
) -> Result<Vec<f64>, SourceError> {
    match format {
        SourceFormat::Parquet => columnar::decode_column(bytes, column),
        SourceFormat::Csv => delimited::decode_column(&bytes, column),
    }
}

/// Resolve, read and decode one column, blocking the current thread.
pub fn load_samples(source: &SampleSource, column: &str) -> Result<Vec<f64>, SourceError> {
    let format = source.format()?;
    let bytes = source.read_bytes()?;
    let samples = decode_column(bytes, format, column)?;

    tracing::debug!(
        source = %source,
        column,
        format = format.name(),
        samples = samples.len(),
        "loaded sample column"
    );

    Ok(samples)
}

/// Resolve, read and decode one column from async code.
///
/// Remote reads share `client`; decoding runs on the blocking pool.
#[cfg(feature = "webhdfs")]
pub async fn load_samples_async(
    source: &SampleSource,
    column: &str,
    client: &WebHdfsClient,
) -> Result<Vec<f64>, SourceError> {
    let format = source.format()?;
    let bytes = source.read_bytes_async(client).await?;
    let owned_column = column.to_string();
    let samples = tokio::task::spawn_blocking(move || decode_column(bytes, format, &owned_column))
        .await
        .map_err(|e| SourceError::Io {
            path: source.to_string(),
            message: e.to_string(),
        })??;

    tracing::debug!(
        source = %source,
        column,
        format = format.name(),
        samples = samples.len(),
        "loaded sample column"
    );

    Ok(samples)
}

fn read_local(path: &Path) -> Result<Bytes, SourceError> {
    match std::fs::read(path) {
        Ok(data) => Ok(Bytes::from(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SourceError::NotFound(path.display().to_string()))
        }
        Err(e) => Err(SourceError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
    }
}
