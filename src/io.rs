//! Writer trait and output format dispatch
//!
//! Every output (graph JSON, route JSON, HTML pages) is produced by a [`Writer`]
//! from a loaded [`Dataset`]. The CLI picks writers by format id through the
//! [`FormatRegistry`].

use std::path::Path;

use thiserror::Error;

use crate::dataset::Dataset;
use crate::graph_writer::GraphWriter;
use crate::html_writer::HtmlWriter;
use crate::routes::RouteWriter;

/// Errors that can occur while writing outputs
#[derive(Error, Debug)]
pub enum IoError {
    /// The output format is not supported
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A rendering/serialization error occurred
    #[error("write error: {0}")]
    Write(String),
}

/// Result type for writer operations
pub type IoResult<T> = Result<T, IoError>;

/// A writer renders a dataset to a specific output format
pub trait Writer {
    /// Write the dataset into the output directory
    fn write(&self, dataset: &Dataset, output: &Path) -> IoResult<()>;

    /// Identifier for this output format (e.g., "html", "graph-json")
    fn format_id(&self) -> &str;
}

/// Registry of available writers
pub struct FormatRegistry {
    writers: Vec<Box<dyn Writer>>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            writers: Vec::new(),
        }
    }

    /// Create a registry with `HtmlWriter` (html), `GraphWriter` (graph-json)
    /// and `RouteWriter` (routes-json) registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_writer(Box::new(HtmlWriter::new()));
        registry.register_writer(Box::new(GraphWriter::new()));
        registry.register_writer(Box::new(RouteWriter::new()));
        registry
    }

    /// Register a writer
    pub fn register_writer(&mut self, writer: Box<dyn Writer>) {
        self.writers.push(writer);
    }

    /// Find a writer by format ID
    pub fn writer_for_format(&self, format_id: &str) -> IoResult<&dyn Writer> {
        self.writers
            .iter()
            .find(|w| w.format_id().eq_ignore_ascii_case(format_id))
            .map(|w| w.as_ref())
            .ok_or_else(|| IoError::UnsupportedFormat(format_id.to_string()))
    }

    /// Format ids of all registered writers, in registration order
    pub fn format_ids(&self) -> Vec<&str> {
        self.writers.iter().map(|w| w.format_id()).collect()
    }
}

/// Serialize a value as pretty JSON into `output/file_name`
pub(crate) fn write_json<T: serde::Serialize>(
    value: &T,
    output: &Path,
    file_name: &str,
) -> IoResult<()> {
    std::fs::create_dir_all(output)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| IoError::Write(format!("JSON serialization failed: {}", e)))?;
    std::fs::write(output.join(file_name), json)?;
    Ok(())
}
