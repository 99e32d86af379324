//! Miette integration for pretty error reporting.

use miette::{Diagnostic, Severity};
use thiserror::Error;

use super::{Stage, TransformError};

/// A diagnostic wrapper for transform errors compatible with miette.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct TransformDiagnostic {
    /// The error message
    pub message: String,

    #[source]
    /// The underlying error source
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,

    #[help]
    /// Help text for the user
    pub help: Option<String>,

    #[diagnostic(severity)]
    /// Severity level
    pub severity: Severity,
}

fn help_for(stage: Stage) -> &'static str {
    match stage {
        Stage::ResolveInput => "Check that SOURCE exists and is readable",
        Stage::Open => "Check that the TARGET directory exists and is writable",
        Stage::Read => "SOURCE is malformed; the output written so far is incomplete",
        Stage::Identifier => "Check that the identifier service (--url) is reachable",
        Stage::Transform => "The transformation does not apply to this input",
        Stage::Serialize => "A transformed record could not be serialized",
        Stage::Write => "Check free disk space and permissions on TARGET",
    }
}

impl From<TransformError> for TransformDiagnostic {
    fn from(e: TransformError) -> Self {
        TransformDiagnostic {
            message: format!(
                "[{}] on '{}' after {} record(s)",
                e.stage, e.destination, e.processed
            ),
            help: Some(help_for(e.stage).into()),
            source: Some(e.error),
            severity: Severity::Error,
        }
    }
}

impl From<TransformError> for miette::Report {
    fn from(e: TransformError) -> Self {
        miette::Report::new(TransformDiagnostic::from(e))
    }
}
