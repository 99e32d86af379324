//! Run options for a transform pipeline.

use crate::format::Indent;
use crate::ids::DEFAULT_BATCH_SIZE;
use crate::io::DEFAULT_HIGH_WATER_MARK;
use crate::transform::DEFAULT_ID_FIELD;

/// Records between two progress notifications unless configured otherwise.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;

/// Options shared by every transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    /// Output indentation
    pub indent: Indent,
    /// Name of the identifier field
    pub id_field: String,
    /// Identifiers fetched per batch
    pub batch_size: usize,
    /// Buffered output bytes at which the source is paused
    pub high_water_mark: usize,
    /// Records between progress notifications; `0` disables them
    pub progress_interval: u64,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            indent: Indent::None,
            id_field: DEFAULT_ID_FIELD.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Set the identifier batch size. Zero is raised to one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_high_water_mark(mut self, bytes: usize) -> Self {
        self.high_water_mark = bytes;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }
}
