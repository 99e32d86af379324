//! Externally issued record identifiers.
//!
//! This module provides:
//! - `IdentifierService`: Trait for services that issue identifiers in batches
//! - `IdCache`: Prefetching buffer that keeps a batch ready ahead of demand
//! - `CouchUuidService`: CouchDB `/_uuids` client (feature `couchdb`)

mod cache;
#[cfg(feature = "couchdb")]
mod couchdb;

use async_trait::async_trait;
use thiserror::Error;

pub use cache::{CacheError, CacheEvent, CacheState, DEFAULT_BATCH_SIZE, IdCache};
#[cfg(feature = "couchdb")]
pub use couchdb::{CouchUuidService, DEFAULT_COUCHDB_URL};

/// An opaque token, unique for the lifetime of a run.
pub type Identifier = String;

/// Errors reported by an identifier service.
#[derive(Debug, Error)]
pub enum IdServiceError {
    #[cfg(feature = "couchdb")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid service URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("identifier service error: {0}")]
    Service(String),
}

/// A service that issues unique identifiers in batches.
#[async_trait]
pub trait IdentifierService: Send + Sync + std::fmt::Debug {
    /// Human readable location of the service, for logs.
    fn endpoint(&self) -> &str;

    /// Fetch `count` fresh identifiers, in issue order.
    async fn fetch_batch(&self, count: usize) -> Result<Vec<Identifier>, IdServiceError>;
}
