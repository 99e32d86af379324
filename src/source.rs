//! Record sources: lazy, ordered streams of parsed records.
//!
//! A source yields one structural marker describing the root container,
//! then records in input order, then end-of-input. Reading happens only
//! inside [`RecordSource::next_event`], so a source that is not being
//! pulled is not reading either; `pause`/`resume` make that suspension
//! explicit and a pull while paused is reported as an error.

use async_trait::async_trait;
use thiserror::Error;

/// Shape of the root container of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Root is an array; records are its elements
    Array,
    /// Root is a single object, passed through as one record
    Object,
}

/// One decoded unit of input.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A parsed JSON document
    Document(serde_json::Value),
    /// A raw tabular row
    Row(Vec<String>),
}

/// An event produced by a record source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// The root container shape; emitted once, before any record
    Container(ContainerKind),
    /// Column names of a tabular source; emitted once, before any row
    Header(Vec<String>),
    Record(Record),
}

/// Errors raised while decoding a source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "csv")]
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("input is empty")]
    Empty,

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unexpected character '{found}' at byte {offset}, expected {expected}")]
    Unexpected {
        found: char,
        offset: u64,
        expected: &'static str,
    },

    #[error("source read while paused")]
    Paused,
}

/// A lazy, ordered, finite sequence of records.
#[async_trait]
pub trait RecordSource: Send {
    /// Returns an identifier for this source (path, "-" for stdin, ...).
    fn id(&self) -> &str;

    /// Pull the next event. `Ok(None)` signals end-of-input.
    async fn next_event(&mut self) -> Result<Option<SourceEvent>, SourceError>;

    /// Suspend reading from the underlying byte stream.
    fn pause(&mut self);

    /// Allow reading from the underlying byte stream again.
    fn resume(&mut self);

    fn is_paused(&self) -> bool;
}
