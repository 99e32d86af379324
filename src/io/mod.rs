//! I/O abstractions for input providers, output targets and the output sink.
//!
//! This module provides:
//! - `InputProvider`: Trait for async input sources
//! - `OutputTarget`: Trait for async output destinations
//! - `OutputSink`: Buffered fragment writer that reports backpressure
//! - Standard implementations for files, stdin/stdout
//! - In-memory implementations for testing

mod input;
mod memory;
mod output;
mod sink;
mod std_io;

pub use input::InputProvider;
pub use memory::{InMemorySink, InMemorySource};
pub use output::OutputTarget;
pub use sink::{DEFAULT_HIGH_WATER_MARK, OutputSink};
pub use std_io::{FileInput, FileOutput, StdinInput, StdoutOutput};
