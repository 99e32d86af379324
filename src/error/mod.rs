//! Error types for doctransform runs.
//!
//! This module provides:
//! - `Stage`: Indicates where a run failed
//! - `TransformError`: The single fatal error a run reports, with enough
//!   context (destination, records processed) to diagnose and re-run
//!
//! Component-level errors (`SourceError`, `CacheError`, `RecordError`, ...)
//! live next to their components and are boxed into `TransformError`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Error while resolving or opening the source
    ResolveInput,
    /// Error while opening the destination
    Open,
    /// Malformed input or I/O failure while reading the source
    Read,
    /// Identifier service or cache failure
    Identifier,
    /// A record could not be transformed
    Transform,
    Serialize,
    /// I/O failure while writing or closing the destination
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::ResolveInput => write!(f, "ResolveInput"),
            Stage::Open => write!(f, "Open"),
            Stage::Read => write!(f, "Read"),
            Stage::Identifier => write!(f, "Identifier"),
            Stage::Transform => write!(f, "Transform"),
            Stage::Serialize => write!(f, "Serialize"),
            Stage::Write => write!(f, "Write"),
        }
    }
}

/// A fatal error that aborted a transform run.
///
/// Every error kind is fatal: there is no retry and no partial-result
/// promotion. The destination is left as the last successful write left it.
#[derive(Debug)]
pub struct TransformError {
    /// Stage where the error occurred
    pub stage: Stage,
    /// Destination of the run (file path, "-" for stdout, etc.)
    pub destination: String,
    /// Records processed before the failure
    pub processed: u64,
    /// The underlying error
    pub error: Box<dyn std::error::Error + Send + Sync>,
}

impl TransformError {
    pub fn new(
        stage: Stage,
        destination: impl Into<String>,
        processed: u64,
        error: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            stage,
            destination: destination.into(),
            processed,
            error: error.into(),
        }
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} after {} record(s): {}",
            self.stage, self.destination, self.processed, self.error
        )
    }
}

impl std::error::Error for TransformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error.as_ref())
    }
}

#[cfg(feature = "miette")]
mod miette_impl;

#[cfg(feature = "miette")]
pub use miette_impl::*;
