//! CouchDB `/_uuids` client.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use super::{IdServiceError, Identifier, IdentifierService};

/// CouchDB instance used when none is configured.
pub const DEFAULT_COUCHDB_URL: &str = "http://localhost:5984";

#[derive(Debug, Deserialize)]
struct UuidsResponse {
    uuids: Vec<String>,
}

/// Fetches identifiers from a CouchDB instance.
///
/// `/_uuids` lives at the instance root, so any database path or query on
/// the configured URL is dropped.
#[derive(Debug, Clone)]
pub struct CouchUuidService {
    client: Client,
    root: Url,
    endpoint: String,
}

impl CouchUuidService {
    /// Create a client for the CouchDB instance behind `url`.
    pub fn new(url: &str) -> Result<Self, IdServiceError> {
        Self::with_client(Client::new(), url)
    }

    /// Create a client using a preconfigured `reqwest::Client`.
    pub fn with_client(client: Client, url: &str) -> Result<Self, IdServiceError> {
        let root = Self::root_url(url)?;
        let endpoint = root.as_str().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            root,
            endpoint,
        })
    }

    /// Strip path, query and fragment from `url`.
    pub fn root_url(url: &str) -> Result<Url, IdServiceError> {
        let mut parsed = Url::parse(url).map_err(|e| IdServiceError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(IdServiceError::InvalidUrl {
                url: url.to_string(),
                reason: "not a base URL".into(),
            });
        }
        parsed.set_path("/");
        parsed.set_query(None);
        parsed.set_fragment(None);
        Ok(parsed)
    }

    /// The `/_uuids` request URL for a batch of `count`.
    pub fn uuids_url(&self, count: usize) -> Url {
        let mut url = self.root.clone();
        url.set_path("/_uuids");
        url.query_pairs_mut()
            .append_pair("count", &count.to_string());
        url
    }
}

#[async_trait]
impl IdentifierService for CouchUuidService {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_batch(&self, count: usize) -> Result<Vec<Identifier>, IdServiceError> {
        let url = self.uuids_url(count);
        debug!(url = %url, "Requesting uuids");

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body: UuidsResponse = response.json().await?;

        if body.uuids.len() != count {
            return Err(IdServiceError::Service(format!(
                "requested {count} uuids, received {}",
                body.uuids.len()
            )));
        }
        Ok(body.uuids)
    }
}
