//! Shipment record sources
//!
//! The upstream source is a spreadsheet-backed endpoint that answers `GET` with
//! a JSON array of shipment objects. A local JSON export can stand in for it.
//! Every source-level failure is reported as a [`SourceError`]; malformed
//! individual records are not errors and pass through untouched.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;

use crate::record::ShipmentRecord;

/// Errors that prevent a record list from loading
#[derive(Error, Debug)]
pub enum SourceError {
    /// The configured URL could not be parsed
    #[error("invalid source URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Network or client failure before a response arrived
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The source answered with a non-2xx status
    #[error("source responded with HTTP {0}")]
    Status(StatusCode),

    /// A local export could not be read
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The body is not JSON
    #[error("response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The body is JSON but not an array
    #[error("expected a JSON array of shipments, got {0}")]
    Shape(&'static str),
}

/// Coarse classification used by the views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The source could not be reached or refused the request
    Transport,
    /// The source answered with something other than a shipment list
    Shape,
}

impl SourceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SourceError::InvalidUrl { .. }
            | SourceError::Transport(_)
            | SourceError::Status(_)
            | SourceError::Read { .. } => FailureKind::Transport,
            SourceError::Parse(_) | SourceError::Shape(_) => FailureKind::Shape,
        }
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Something that can produce the full shipment list once per call
pub trait RecordSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = SourceResult<Vec<ShipmentRecord>>> + Send;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// Parse a response body into records, rejecting anything but an array
pub fn parse_records(body: &[u8]) -> SourceResult<Vec<ShipmentRecord>> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Array(items) => Ok(items.into_iter().map(ShipmentRecord::from_value).collect()),
        other => Err(SourceError::Shape(json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Fetches records with a plain `GET` (no body, no auth header)
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url: Url,
}

impl HttpSource {
    /// Create a source for `url`. No timeout is applied unless one is given.
    pub fn new(url: &str, timeout: Option<Duration>) -> SourceResult<Self> {
        let url = Url::parse(url).map_err(|e| SourceError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            url,
        })
    }
}

impl RecordSource for HttpSource {
    async fn fetch(&self) -> SourceResult<Vec<ShipmentRecord>> {
        tracing::info!(url = %self.url, "fetching shipments");
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %self.url, %status, "shipment source returned an error status");
            return Err(SourceError::Status(status));
        }

        let body = response.bytes().await?;
        let records = parse_records(&body)?;
        tracing::debug!(count = records.len(), "received shipments");
        Ok(records)
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// Reads records from a local JSON export of the sheet
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for FileSource {
    async fn fetch(&self) -> SourceResult<Vec<ShipmentRecord>> {
        tracing::info!(path = %self.path.display(), "reading shipments");
        let body = tokio::fs::read(&self.path)
            .await
            .map_err(|source| SourceError::Read {
                path: self.path.clone(),
                source,
            })?;
        parse_records(&body)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// The source selected by configuration
#[derive(Debug, Clone)]
pub enum ConfiguredSource {
    Http(HttpSource),
    File(FileSource),
}

impl ConfiguredSource {
    /// Pick a source from configuration. A local file takes precedence over a
    /// URL. Returns `Ok(None)` when neither is configured.
    pub fn from_config(
        url: Option<&str>,
        input: Option<&Path>,
        timeout: Option<Duration>,
    ) -> SourceResult<Option<Self>> {
        if let Some(path) = input {
            return Ok(Some(Self::File(FileSource::new(path))));
        }
        match url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => Ok(Some(Self::Http(HttpSource::new(url, timeout)?))),
            None => Ok(None),
        }
    }
}

impl RecordSource for ConfiguredSource {
    async fn fetch(&self) -> SourceResult<Vec<ShipmentRecord>> {
        match self {
            ConfiguredSource::Http(source) => source.fetch().await,
            ConfiguredSource::File(source) => source.fetch().await,
        }
    }

    fn describe(&self) -> String {
        match self {
            ConfiguredSource::Http(source) => source.describe(),
            ConfiguredSource::File(source) => source.describe(),
        }
    }
}
