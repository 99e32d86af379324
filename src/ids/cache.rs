//! Identifier prefetch cache.
//!
//! Identifiers are issued in network-bound batches while records consume
//! them one at a time, so the cache keeps a batch buffered and starts the
//! next fetch when a single identifier is left. At most one fetch is in
//! flight; callers that find the buffer empty wait for it in arrival order.

use std::collections::VecDeque;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace};

use super::{IdServiceError, Identifier, IdentifierService};

/// Identifiers requested per batch unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 500;

const EVENT_CAPACITY: usize = 64;

/// Notifications published by the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A batch fetch has started
    Fetching { count: usize },
    /// A batch fetch returned `count` identifiers
    NewIdentifiers { count: usize },
    /// The first batch has been buffered; published once
    Ready,
    /// A batch fetch failed
    Error { message: String },
}

/// Observable state of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing buffered and nothing being fetched
    Empty,
    /// Nothing buffered, a fetch is in flight
    Fetching,
    /// At least one identifier is buffered
    Ready,
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Service(#[from] IdServiceError),

    #[error("identifier fetch aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),

    /// The buffer ran dry with no refill armed.
    #[error("identifier buffer exhausted with no fetch in flight")]
    Exhausted,
}

type FetchHandle = JoinHandle<Result<Vec<Identifier>, IdServiceError>>;

enum FetchState {
    Idle,
    Fetching(FetchHandle),
}

struct Inner {
    buffer: VecDeque<Identifier>,
    fetch: FetchState,
    announced_ready: bool,
    fetches: u64,
}

struct Shared {
    service: Arc<dyn IdentifierService>,
    batch_size: usize,
    state: Mutex<Inner>,
    events: broadcast::Sender<CacheEvent>,
}

fn spawn_fetch(
    service: &Arc<dyn IdentifierService>,
    events: &broadcast::Sender<CacheEvent>,
    count: usize,
) -> FetchHandle {
    let service = Arc::clone(service);
    let events = events.clone();

    tokio::spawn(async move {
        info!(count, endpoint = %service.endpoint(), "Fetching identifiers");
        let _ = events.send(CacheEvent::Fetching { count });

        match service.fetch_batch(count).await {
            Ok(ids) => {
                debug!(received = ids.len(), "Identifiers arrived");
                let _ = events.send(CacheEvent::NewIdentifiers { count: ids.len() });
                Ok(ids)
            }
            Err(e) => {
                error!(error = %e, endpoint = %service.endpoint(), "Identifier fetch failed");
                let _ = events.send(CacheEvent::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    })
}

impl Shared {
    /// Start a fetch unless one is already in flight.
    fn arm_refill(&self, inner: &mut Inner) {
        if matches!(inner.fetch, FetchState::Idle) {
            trace!(buffered = inner.buffer.len(), "Arming refill");
            inner.fetch =
                FetchState::Fetching(spawn_fetch(&self.service, &self.events, self.batch_size));
            inner.fetches += 1;
        }
    }

    /// Wait for the in-flight fetch and append its batch.
    ///
    /// Returns `false` when no fetch was in flight.
    async fn land_refill(&self, inner: &mut Inner) -> Result<bool, CacheError> {
        let FetchState::Fetching(handle) = &mut inner.fetch else {
            return Ok(false);
        };
        let joined = handle.await;
        inner.fetch = FetchState::Idle;

        let ids = joined??;
        inner.buffer.extend(ids);
        if !inner.announced_ready {
            inner.announced_ready = true;
            let _ = self.events.send(CacheEvent::Ready);
        }
        Ok(true)
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let FetchState::Fetching(handle) = &self.state.get_mut().fetch {
            handle.abort();
        }
    }
}

/// Prefetching identifier buffer.
///
/// Cloning yields another handle to the same buffer.
#[derive(Clone)]
pub struct IdCache {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for IdCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdCache")
            .field("service", &self.shared.service)
            .field("batch_size", &self.shared.batch_size)
            .finish()
    }
}

impl IdCache {
    /// Create a cache and start fetching the first batch.
    ///
    /// The first fetch runs as a spawned task, so this must be called from
    /// within a tokio runtime. On a current-thread runtime, subscribers
    /// registered right after construction still observe its `Fetching`
    /// event; a multi-thread runtime may start the fetch first.
    pub fn new(service: Arc<dyn IdentifierService>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let first = spawn_fetch(&service, &events, batch_size);

        Self {
            shared: Arc::new(Shared {
                service,
                batch_size,
                state: Mutex::new(Inner {
                    buffer: VecDeque::new(),
                    fetch: FetchState::Fetching(first),
                    announced_ready: false,
                    fetches: 1,
                }),
                events,
            }),
        }
    }

    /// Subscribe to cache notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.shared.events.subscribe()
    }

    pub fn batch_size(&self) -> usize {
        self.shared.batch_size
    }

    pub fn endpoint(&self) -> &str {
        self.shared.service.endpoint()
    }

    pub async fn state(&self) -> CacheState {
        let inner = self.shared.state.lock().await;
        match (&inner.fetch, inner.buffer.is_empty()) {
            (_, false) => CacheState::Ready,
            (FetchState::Fetching(_), true) => CacheState::Fetching,
            (FetchState::Idle, true) => CacheState::Empty,
        }
    }

    /// Whether a fetch is currently in flight.
    pub async fn is_fetching(&self) -> bool {
        matches!(
            self.shared.state.lock().await.fetch,
            FetchState::Fetching(_)
        )
    }

    /// Identifiers currently buffered.
    pub async fn buffered(&self) -> usize {
        self.shared.state.lock().await.buffer.len()
    }

    /// Number of batch fetches started so far.
    pub async fn fetches(&self) -> u64 {
        self.shared.state.lock().await.fetches
    }

    /// Wait until the first batch is buffered.
    pub async fn ready(&self) -> Result<(), CacheError> {
        let mut inner = self.shared.state.lock().await;
        if inner.buffer.is_empty() {
            self.shared.land_refill(&mut inner).await?;
        }
        if inner.buffer.is_empty() {
            return Err(CacheError::Exhausted);
        }
        Ok(())
    }

    /// Take the next identifier.
    ///
    /// Handing out the last buffered identifier arms a refill first; a
    /// caller that then finds the buffer empty waits for that refill.
    pub async fn request_identifier(&self) -> Result<Identifier, CacheError> {
        let mut inner = self.shared.state.lock().await;
        loop {
            match inner.buffer.len() {
                0 => {
                    if !self.shared.land_refill(&mut inner).await? {
                        return Err(CacheError::Exhausted);
                    }
                }
                1 => {
                    self.shared.arm_refill(&mut inner);
                    return inner.buffer.pop_front().ok_or(CacheError::Exhausted);
                }
                _ => return inner.buffer.pop_front().ok_or(CacheError::Exhausted),
            }
        }
    }
}
