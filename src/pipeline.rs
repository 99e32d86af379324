//! Streaming transform pipeline.
//!
//! The pipeline pulls one event at a time from a [`RecordSource`], applies a
//! [`Transformer`], serializes the result and hands it to an [`OutputSink`].
//! The source is paused while an identifier is awaited and while the sink
//! drains, so at most one record is in flight at any time.

use std::sync::Arc;

use tracing::{debug, error, info, trace, warn};

use crate::config::{DEFAULT_PROGRESS_INTERVAL, TransformOptions};
use crate::error::{Stage, TransformError};
use crate::format::fragment::{self, ARRAY_CLOSE, ARRAY_OPEN};
use crate::ids::IdCache;
use crate::io::{OutputSink, OutputTarget};
use crate::source::{ContainerKind, Record, RecordSource, SourceEvent};
use crate::transform::{TransformKind, Transformer};

/// Notifications emitted during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// `count` records have been processed
    Progress { count: u64 },
    /// The run finished and the destination was closed
    Completed { count: u64, destination: String },
    /// The run aborted
    Failed {
        count: u64,
        destination: String,
        message: String,
    },
}

/// Receives pipeline notifications.
pub trait PipelineObserver: Send + Sync {
    fn notify(&self, event: &PipelineEvent);
}

/// Renders notifications as log events.
#[derive(Debug, Clone, Copy)]
pub struct LogObserver {
    progress_interval: u64,
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_INTERVAL)
    }
}

impl LogObserver {
    /// `progress_interval` must match the pipeline's, so a final count
    /// already reported as progress is not logged twice.
    pub fn new(progress_interval: u64) -> Self {
        Self { progress_interval }
    }

    pub(crate) fn reports_final_count(&self, count: u64) -> bool {
        self.progress_interval == 0 || count % self.progress_interval != 0
    }
}

impl PipelineObserver for LogObserver {
    fn notify(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::Progress { count } => info!("Transformed {count} records"),
            PipelineEvent::Completed { count, destination } => {
                if self.reports_final_count(*count) {
                    info!("Transformed {count} records");
                }
                info!(destination = %destination, count, "Saved {count} records to {destination}");
            }
            PipelineEvent::Failed {
                count,
                destination,
                message,
            } => error!(destination = %destination, count, "Transform failed: {message}"),
        }
    }
}

/// Per-run counters.
///
/// `processed` counts every record pulled from the source and drives
/// progress. `emitted` counts records that produced output and decides
/// whether an array element needs a leading comma.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounter {
    pub processed: u64,
    pub emitted: u64,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Records pulled from the source
    pub processed: u64,
    /// Records written to the destination
    pub emitted: u64,
    pub destination: String,
    /// Root container of the input, if the input had one
    pub container: Option<ContainerKind>,
    pub bytes_written: u64,
}

/// Streams records from a source to a target through one transformation.
#[derive(Clone)]
pub struct TransformPipeline {
    kind: TransformKind,
    options: TransformOptions,
    cache: Option<IdCache>,
    observer: Arc<dyn PipelineObserver>,
}

impl std::fmt::Debug for TransformPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformPipeline")
            .field("kind", &self.kind)
            .field("options", &self.options)
            .field("cache", &self.cache)
            .finish()
    }
}

struct Run<'a> {
    destination: &'a str,
    counter: RunCounter,
    container: Option<ContainerKind>,
}

impl Run<'_> {
    fn error(
        &self,
        stage: Stage,
        error: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> TransformError {
        TransformError::new(stage, self.destination, self.counter.processed, error)
    }

    fn in_array(&self) -> bool {
        self.container == Some(ContainerKind::Array)
    }
}

impl TransformPipeline {
    /// Create a pipeline that logs its notifications.
    pub fn new(kind: TransformKind, options: TransformOptions) -> Self {
        let observer = Arc::new(LogObserver::new(options.progress_interval));
        Self {
            kind,
            options,
            cache: None,
            observer,
        }
    }

    /// Use `cache` for transformations that assign identifiers.
    pub fn with_id_cache(mut self, cache: IdCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the notification observer.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    pub fn id_cache(&self) -> Option<&IdCache> {
        self.cache.as_ref()
    }

    /// Run the pipeline to completion.
    ///
    /// Every error is fatal. Whatever was written before the failure stays
    /// in the destination.
    pub async fn run(
        &self,
        source: &mut dyn RecordSource,
        target: &dyn OutputTarget,
    ) -> Result<RunSummary, TransformError> {
        let mut run = Run {
            destination: target.id(),
            counter: RunCounter::default(),
            container: None,
        };

        info!(
            transform = %self.kind,
            source = %source.id(),
            destination = %run.destination,
            "Starting transform"
        );

        match self.drive(source, target, &mut run).await {
            Ok(bytes_written) => {
                self.observer.notify(&PipelineEvent::Completed {
                    count: run.counter.processed,
                    destination: run.destination.to_string(),
                });
                Ok(RunSummary {
                    processed: run.counter.processed,
                    emitted: run.counter.emitted,
                    destination: run.destination.to_string(),
                    container: run.container,
                    bytes_written,
                })
            }
            Err(e) => {
                self.observer.notify(&PipelineEvent::Failed {
                    count: e.processed,
                    destination: e.destination.clone(),
                    message: e.error.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        source: &mut dyn RecordSource,
        target: &dyn OutputTarget,
        run: &mut Run<'_>,
    ) -> Result<u64, TransformError> {
        let cache = if self.kind.needs_identifier() {
            let cache = self.cache.as_ref().ok_or_else(|| {
                run.error(
                    Stage::Identifier,
                    format!("'{}' requires an identifier cache", self.kind),
                )
            })?;
            // a dead service aborts before the destination is touched
            cache.ready().await.map_err(|e| run.error(Stage::Identifier, e))?;
            Some(cache)
        } else {
            None
        };

        let mut sink = OutputSink::open(target, self.options.high_water_mark)
            .await
            .map_err(|e| run.error(Stage::Open, e))?;

        let streamed = self.stream(source, cache, &mut sink, run).await;
        match streamed {
            Ok(()) => {
                if run.in_array() {
                    sink.write(ARRAY_CLOSE);
                }
                sink.end().await.map_err(|e| run.error(Stage::Write, e))
            }
            Err(e) => {
                // keep what was accepted before the failure
                if e.stage != Stage::Write {
                    if let Err(flush) = sink.end().await {
                        warn!(error = %flush, destination = %run.destination, "Failed to flush partial output");
                    }
                }
                Err(e)
            }
        }
    }

    async fn stream(
        &self,
        source: &mut dyn RecordSource,
        cache: Option<&IdCache>,
        sink: &mut OutputSink,
        run: &mut Run<'_>,
    ) -> Result<(), TransformError> {
        let mut transformer = Transformer::new(self.kind, self.options.id_field.clone());

        loop {
            let event = source
                .next_event()
                .await
                .map_err(|e| run.error(Stage::Read, e))?;

            match event {
                None => break,
                Some(SourceEvent::Container(kind)) => {
                    if run.container.is_some() {
                        warn!(?kind, "Ignoring repeated container marker");
                        continue;
                    }
                    debug!(?kind, "Container");
                    run.container = Some(kind);
                    if kind == ContainerKind::Array {
                        self.write(sink, source, run, ARRAY_OPEN).await?;
                        if source.is_paused() {
                            source.resume();
                        }
                    }
                }
                Some(SourceEvent::Header(header)) => {
                    debug!(columns = header.len(), "Captured header row");
                    transformer.capture_header(header);
                }
                Some(SourceEvent::Record(record)) => {
                    self.process(record, &transformer, cache, sink, source, run)
                        .await?;
                }
            }
        }

        Ok(())
    }

    async fn process(
        &self,
        record: Record,
        transformer: &Transformer,
        cache: Option<&IdCache>,
        sink: &mut OutputSink,
        source: &mut dyn RecordSource,
        run: &mut Run<'_>,
    ) -> Result<(), TransformError> {
        let id = match cache {
            Some(cache) => {
                source.pause();
                let id = cache
                    .request_identifier()
                    .await
                    .map_err(|e| run.error(Stage::Identifier, e))?;
                Some(id)
            }
            None => None,
        };

        let output = transformer
            .apply(record, id)
            .map_err(|e| run.error(Stage::Transform, e))?;

        if let Some(value) = output {
            let text = fragment::to_json_text(&value, self.options.indent)
                .map_err(|e| run.error(Stage::Serialize, e))?;
            let text = if run.in_array() {
                fragment::array_element(&text, self.options.indent, run.counter.emitted == 0)
            } else {
                text
            };
            self.write(sink, source, run, &text).await?;
            run.counter.emitted += 1;
        } else {
            trace!(record = run.counter.processed, "Record produced no output");
        }

        if source.is_paused() {
            source.resume();
        }

        run.counter.processed += 1;
        let interval = self.options.progress_interval;
        if interval > 0 && run.counter.processed % interval == 0 {
            self.observer.notify(&PipelineEvent::Progress {
                count: run.counter.processed,
            });
        }
        Ok(())
    }

    /// Write a fragment. When the sink reports backpressure the source is
    /// paused and stays paused until the caller resumes it.
    async fn write(
        &self,
        sink: &mut OutputSink,
        source: &mut dyn RecordSource,
        run: &Run<'_>,
        fragment: &str,
    ) -> Result<(), TransformError> {
        if !sink.write(fragment) {
            source.pause();
            trace!(buffered = sink.buffered_len(), "Backpressure, draining sink");
            sink.drain().await.map_err(|e| run.error(Stage::Write, e))?;
        }
        Ok(())
    }
}
