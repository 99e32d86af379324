//! # doctransform
//!
//! Streaming transformations over large JSON and CSV document collections.
//!
//! ## Overview
//!
//! doctransform provides:
//! - **Streaming decoding**: JSON arrays/objects and CSV rows are decoded one
//!   record at a time, never the whole input at once
//! - **Transformations**: clear the identifier field, assign fresh
//!   identifiers, or flatten CSV rows into objects
//! - **Identifier prefetching**: identifiers are fetched in batches from a
//!   CouchDB instance (or any `IdentifierService`) ahead of demand
//! - **Backpressure**: the source is paused whenever an identifier is pending
//!   or the output buffer is full
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use doctransform::{Indent, TransformBuilder, TransformKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let summary = TransformBuilder::new(TransformKind::ClearIds)
//!         .source("docs.json")
//!         .target("docs.clean.json")
//!         .with_indent(Indent::Spaces(2))
//!         .build()?
//!         .run()
//!         .await?;
//!
//!     println!("{} records", summary.processed);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `csv` - CSV input (enabled by default)
//! - `couchdb` - CouchDB `/_uuids` identifier client (enabled by default)
//! - `yaml` - YAML job files
//! - `miette` - Pretty error reporting with miette
//! - `sarge` - `sarge` argument types for `Indent` and `TransformKind`
//!
//! ## Memory model
//!
//! At most one record is held at a time. Output is buffered up to the
//! configured high-water mark and identifiers up to one batch.

// Core modules
pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod ids;
pub mod io;
pub mod pipeline;
pub mod source;
pub mod transform;

// Re-exports for convenience
pub use builder::{TransformBuilder, TransformJob};
pub use config::{ConfigError, TransformConfig, TransformOptions};
pub use error::{Stage, TransformError};
pub use format::{FormatError, FormatKind, Indent, JsonRecordSource};
#[cfg(feature = "csv")]
pub use format::CsvRowSource;
pub use ids::{CacheError, CacheEvent, CacheState, IdCache, IdServiceError, Identifier, IdentifierService};
#[cfg(feature = "couchdb")]
pub use ids::CouchUuidService;
pub use io::{
    FileInput, FileOutput, InMemorySink, InMemorySource, InputProvider, OutputSink, OutputTarget,
    StdinInput, StdoutOutput,
};
pub use pipeline::{LogObserver, PipelineEvent, PipelineObserver, RunSummary, TransformPipeline};
pub use source::{ContainerKind, Record, RecordSource, SourceError, SourceEvent};
pub use transform::{RecordError, TransformKind, Transformer};

// Miette re-exports
#[cfg(feature = "miette")]
pub use error::TransformDiagnostic;
