//! Configuration types for transform runs.
//!
//! This module provides:
//! - `TransformOptions`: Tunables shared by every transformation
//! - `TransformConfig`: A complete job loaded from a JSON or YAML file

mod file;
mod options;

pub use file::{ConfigError, IndentSetting, TransformConfig};
pub use options::{DEFAULT_PROGRESS_INTERVAL, TransformOptions};
