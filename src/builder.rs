//! Builder for assembling transform jobs from paths and options.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{ConfigError, TransformConfig, TransformOptions};
use crate::error::{Stage, TransformError};
use crate::format::{self, Indent};
use crate::ids::{IdCache, IdentifierService};
use crate::io::{FileInput, FileOutput, InputProvider, OutputTarget, StdinInput, StdoutOutput};
use crate::pipeline::{PipelineObserver, RunSummary, TransformPipeline};
use crate::transform::TransformKind;

#[cfg(feature = "couchdb")]
use crate::ids::{CouchUuidService, DEFAULT_COUCHDB_URL};

pub struct TransformBuilder {
    kind: TransformKind,
    source: Option<String>,
    target: Option<String>,
    input: Option<Arc<dyn InputProvider>>,
    output: Option<Arc<dyn OutputTarget>>,
    options: TransformOptions,
    url: Option<String>,
    service: Option<Arc<dyn IdentifierService>>,
    observer: Option<Arc<dyn PipelineObserver>>,
}

impl TransformBuilder {
    pub fn new(kind: TransformKind) -> Self {
        Self {
            kind,
            source: None,
            target: None,
            input: None,
            output: None,
            options: TransformOptions::default(),
            url: None,
            service: None,
            observer: None,
        }
    }

    /// Read from a path, or stdin for "-".
    pub fn source(mut self, raw: impl Into<String>) -> Self {
        self.source = Some(raw.into());
        self
    }

    /// Write to a path, or stdout for "-".
    pub fn target(mut self, raw: impl Into<String>) -> Self {
        self.target = Some(raw.into());
        self
    }

    /// Read from a prebuilt provider instead of a path.
    pub fn with_input(mut self, provider: Arc<dyn InputProvider>) -> Self {
        self.input = Some(provider);
        self
    }

    /// Write to a prebuilt target instead of a path.
    pub fn with_output(mut self, target: Arc<dyn OutputTarget>) -> Self {
        self.output = Some(target);
        self
    }

    pub fn with_options(mut self, options: TransformOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.options.indent = indent;
        self
    }

    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.options.id_field = field.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.options = self.options.with_batch_size(batch_size);
        self
    }

    /// CouchDB instance to fetch identifiers from.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Fetch identifiers from `service` instead of CouchDB.
    pub fn with_id_service(mut self, service: Arc<dyn IdentifierService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn from_config(config: &TransformConfig) -> Result<Self, ConfigError> {
        let mut builder = TransformBuilder::new(config.kind()?)
            .source(config.source.clone())
            .target(config.target.clone())
            .with_options(config.options()?);
        if let Some(url) = &config.url {
            builder = builder.with_url(url.clone());
        }
        Ok(builder)
    }

    pub fn build(self) -> Result<TransformJob, TransformError> {
        let output = match self.output {
            Some(output) => output,
            None => {
                let raw = self.target.as_deref().ok_or_else(|| {
                    TransformError::new(Stage::Open, "", 0, "no TARGET given")
                })?;
                resolve_output(raw)
            }
        };
        let destination = output.id().to_string();

        let input = match self.input {
            Some(input) => input,
            None => {
                let raw = self.source.as_deref().ok_or_else(|| {
                    TransformError::new(Stage::ResolveInput, &destination, 0, "no SOURCE given")
                })?;
                resolve_input(raw)
            }
        };

        let service = if self.kind.needs_identifier() {
            match self.service {
                Some(service) => Some(service),
                None => Some(default_service(self.url.as_deref(), &destination)?),
            }
        } else {
            None
        };

        Ok(TransformJob {
            kind: self.kind,
            options: self.options,
            input,
            output,
            service,
            observer: self.observer,
        })
    }
}

fn resolve_input(raw: &str) -> Arc<dyn InputProvider> {
    if raw == "-" {
        Arc::new(StdinInput::new())
    } else {
        Arc::new(FileInput::new(PathBuf::from(raw)))
    }
}

fn resolve_output(raw: &str) -> Arc<dyn OutputTarget> {
    if raw == "-" {
        Arc::new(StdoutOutput::new())
    } else {
        Arc::new(FileOutput::new(PathBuf::from(raw)))
    }
}

#[cfg(feature = "couchdb")]
fn default_service(
    url: Option<&str>,
    destination: &str,
) -> Result<Arc<dyn IdentifierService>, TransformError> {
    let url = url.unwrap_or(DEFAULT_COUCHDB_URL);
    let service = CouchUuidService::new(url)
        .map_err(|e| TransformError::new(Stage::Identifier, destination, 0, e))?;
    Ok(Arc::new(service))
}

#[cfg(not(feature = "couchdb"))]
fn default_service(
    _url: Option<&str>,
    destination: &str,
) -> Result<Arc<dyn IdentifierService>, TransformError> {
    Err(TransformError::new(
        Stage::Identifier,
        destination,
        0,
        "no identifier service configured; enable the `couchdb` feature or supply one",
    ))
}

/// A resolved job, ready to run.
pub struct TransformJob {
    kind: TransformKind,
    options: TransformOptions,
    input: Arc<dyn InputProvider>,
    output: Arc<dyn OutputTarget>,
    service: Option<Arc<dyn IdentifierService>>,
    observer: Option<Arc<dyn PipelineObserver>>,
}

impl std::fmt::Debug for TransformJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformJob")
            .field("kind", &self.kind)
            .field("options", &self.options)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("service", &self.service)
            .finish()
    }
}

impl TransformJob {
    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    pub fn source_id(&self) -> &str {
        self.input.id()
    }

    pub fn destination(&self) -> &str {
        self.output.id()
    }

    /// Open the source and stream it to the destination.
    ///
    /// The identifier cache, when needed, is created here so its first
    /// fetch starts on the running executor.
    pub async fn run(&self) -> Result<RunSummary, TransformError> {
        let destination = self.output.id();

        let reader = self
            .input
            .open()
            .await
            .map_err(|e| TransformError::new(Stage::ResolveInput, destination, 0, e))?;
        let mut source = format::open_source(self.kind.input_format(), self.input.id(), reader)
            .map_err(|e| TransformError::new(Stage::ResolveInput, destination, 0, e))?;

        let mut pipeline = TransformPipeline::new(self.kind, self.options.clone());
        if let Some(service) = &self.service {
            pipeline =
                pipeline.with_id_cache(IdCache::new(Arc::clone(service), self.options.batch_size));
        }
        if let Some(observer) = &self.observer {
            pipeline = pipeline.with_observer(Arc::clone(observer));
        }

        pipeline.run(source.as_mut(), self.output.as_ref()).await
    }
}
