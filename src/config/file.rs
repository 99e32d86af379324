//! Job descriptions loaded from configuration files.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::TransformOptions;
use crate::format::Indent;
use crate::transform::TransformKind;

/// Errors raised while loading a job description.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "yaml")]
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported config file extension: '{0}'")]
    UnsupportedExtension(String),

    #[error("unknown transformation: {0}")]
    UnknownTransform(String),

    #[error("--indent option must be a number or \"tabs\", got '{0}'")]
    InvalidIndent(String),
}

/// Indentation as written in a config file: `2`, `"2"` or `"tabs"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IndentSetting {
    Width(u8),
    Named(String),
}

impl IndentSetting {
    pub fn to_indent(&self) -> Result<Indent, ConfigError> {
        match self {
            IndentSetting::Width(0) => Ok(Indent::None),
            IndentSetting::Width(n) => Ok(Indent::Spaces(*n)),
            IndentSetting::Named(s) => {
                Indent::from_str(s).ok_or_else(|| ConfigError::InvalidIndent(s.clone()))
            }
        }
    }
}

/// A complete transform job.
///
/// ```json
/// { "transform": "add-ids", "source": "in.json", "target": "out.json",
///   "indent": 2, "url": "http://localhost:5984" }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    /// Transformation name, e.g. "clear-ids"
    pub transform: String,
    /// Source path, "-" for stdin
    pub source: String,
    /// Target path, "-" for stdout
    pub target: String,
    #[serde(default)]
    pub indent: Option<IndentSetting>,
    /// CouchDB instance issuing identifiers
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub id_field: Option<String>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub high_water_mark: Option<usize>,
    #[serde(default)]
    pub progress_interval: Option<u64>,
}

impl TransformConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a job description, choosing the parser by file extension.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        let text = tokio::fs::read_to_string(path).await?;

        match ext.as_str() {
            "json" => Self::from_json_str(&text),
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => Self::from_yaml_str(&text),
            _ => Err(ConfigError::UnsupportedExtension(ext)),
        }
    }

    pub fn kind(&self) -> Result<TransformKind, ConfigError> {
        TransformKind::from_str(&self.transform)
            .ok_or_else(|| ConfigError::UnknownTransform(self.transform.clone()))
    }

    /// Options with the configured values applied over the defaults.
    pub fn options(&self) -> Result<TransformOptions, ConfigError> {
        let mut options = TransformOptions::default();
        if let Some(indent) = &self.indent {
            options = options.with_indent(indent.to_indent()?);
        }
        if let Some(field) = &self.id_field {
            options = options.with_id_field(field.clone());
        }
        if let Some(batch_size) = self.batch_size {
            options = options.with_batch_size(batch_size);
        }
        if let Some(hwm) = self.high_water_mark {
            options = options.with_high_water_mark(hwm);
        }
        if let Some(interval) = self.progress_interval {
            options = options.with_progress_interval(interval);
        }
        Ok(options)
    }
}
