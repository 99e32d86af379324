//! Input formats, streaming decoders and output fragment helpers.
//!
//! This module provides:
//! - `FormatKind`: The input formats a source can be decoded from
//! - `JsonRecordSource`: Incremental JSON array/object decoder
//! - `CsvRowSource`: Row-by-row CSV decoder (feature `csv`)
//! - `fragment`: Serialization of records into array-element fragments

use tokio::io::AsyncRead;

use thiserror::Error;

use crate::source::RecordSource;

pub mod fragment;
pub mod json;

#[cfg(feature = "csv")]
pub mod csv;

#[cfg(feature = "csv")]
pub use self::csv::CsvRowSource;
pub use fragment::Indent;
pub use json::JsonRecordSource;

/// Represents the supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    /// A JSON array of documents, or a single JSON object
    Json,
    /// CSV with a header row
    Csv,
}

impl std::fmt::Display for FormatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatKind::Json => write!(f, "json"),
            FormatKind::Csv => write!(f, "csv"),
        }
    }
}

impl FormatKind {
    /// Parse a format kind from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Some(FormatKind::Json),
            "csv" => Some(FormatKind::Csv),
            _ => None,
        }
    }

    /// Get file extensions for this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FormatKind::Json => &["json"],
            FormatKind::Csv => &["csv"],
        }
    }

    /// Check if this format is available (feature enabled).
    pub fn is_available(&self) -> bool {
        match self {
            FormatKind::Json => true,

            #[cfg(feature = "csv")]
            FormatKind::Csv => true,
            #[cfg(not(feature = "csv"))]
            FormatKind::Csv => false,
        }
    }
}

/// Infer format from file extension.
pub fn infer_format_from_path(path: &str) -> Option<FormatKind> {
    let ext = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())?;
    FormatKind::from_str(ext)
}

/// Errors that can occur while resolving a format.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The requested format is unknown
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// Format feature not enabled
    #[error("Format '{0}' is not enabled. Enable the corresponding feature.")]
    NotEnabled(FormatKind),
}

/// Wrap a byte stream in the streaming decoder for `kind`.
pub fn open_source<R>(
    kind: FormatKind,
    id: impl Into<String>,
    reader: R,
) -> Result<Box<dyn RecordSource>, FormatError>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    match kind {
        FormatKind::Json => Ok(Box::new(JsonRecordSource::new(id, reader))),

        #[cfg(feature = "csv")]
        FormatKind::Csv => Ok(Box::new(CsvRowSource::new(id, reader))),

        #[allow(unreachable_patterns)]
        _ => Err(FormatError::NotEnabled(kind)),
    }
}
