//! Command-line surface of `doctransform`.
//!
//! ```text
//! doctransform TRANSFORMATION [OPTIONS] SOURCE TARGET
//! ```
//!
//! Options may appear anywhere after the program name, either as
//! `--indent 2` or `--indent=2`.

use thiserror::Error;

use crate::builder::TransformBuilder;
use crate::config::TransformOptions;
use crate::format::Indent;
use crate::transform::TransformKind;

#[cfg(feature = "sarge")]
mod sarge;

pub const USAGE: &str = "\
doctransform TRANSFORMATION [OPTIONS] SOURCE TARGET

Parameters:
  TRANSFORMATION    The operation to perform on SOURCE
  SOURCE            The source file to use as input, '-' for stdin
  TARGET            The filename for saving the output to, '-' for stdout

Transformations:
  clear-ids    Clear the _id property of each document in the SOURCE file
  add-ids      Fetch UUIDs from a CouchDB instance and use as _ids for
               each doc in the SOURCE file.
  csv          Convert a .csv file to JSON. Each row is converted to a
               JSON object, using the values from the first row as
               property names.

Options:
  -i, --indent       The number of spaces to use for indentation, by default
                     output is not indented. Use --indent=tabs to use tabs.
  -u, --url          The CouchDB instance to fetch UUIDs from. Defaults to
                     http://localhost:5984
      --id-field     Name of the identifier property. Defaults to _id
      --batch-size   Number of UUIDs fetched per request
  -c, --config       Load the whole job from a JSON or YAML file";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("No transformation specified")]
    NoTransform,

    #[error("Unknown transformation: {0}")]
    UnknownTransform(String),

    #[error("No SOURCE file")]
    NoSource,

    #[error("No TARGET file")]
    NoTarget,

    #[error("--indent option must be a number or \"tabs\"")]
    InvalidIndent(String),

    #[error("option '{0}' requires a value")]
    MissingValue(String),

    #[error("option '{option}' expects a number, got '{value}'")]
    InvalidNumber { option: String, value: String },

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run a job described on the command line
    Run(TransformArgs),
    /// Run a job described in a config file
    Config(String),
}

/// Arguments of a command-line job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformArgs {
    pub kind: TransformKind,
    pub source: String,
    pub target: String,
    pub indent: Indent,
    pub url: Option<String>,
    pub id_field: Option<String>,
    pub batch_size: Option<usize>,
}

impl TransformArgs {
    pub fn options(&self) -> TransformOptions {
        let mut options = TransformOptions::default().with_indent(self.indent);
        if let Some(field) = &self.id_field {
            options = options.with_id_field(field.clone());
        }
        if let Some(batch_size) = self.batch_size {
            options = options.with_batch_size(batch_size);
        }
        options
    }

    pub fn into_builder(self) -> TransformBuilder {
        let mut builder = TransformBuilder::new(self.kind)
            .with_options(self.options())
            .source(self.source)
            .target(self.target);
        if let Some(url) = self.url {
            builder = builder.with_url(url);
        }
        builder
    }
}

/// Parse an indent value.
pub fn parse_indent(value: &str) -> Result<Indent, CliError> {
    Indent::from_str(value).ok_or_else(|| CliError::InvalidIndent(value.to_string()))
}

/// Parse a transformation name.
pub fn parse_transform(value: &str) -> Result<TransformKind, CliError> {
    TransformKind::from_str(value).ok_or_else(|| CliError::UnknownTransform(value.to_string()))
}

/// Parse arguments, excluding the program name.
pub fn parse_args<I, S>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut positional = Vec::new();
    let mut indent = Indent::None;
    let mut url = None;
    let mut id_field = None;
    let mut batch_size = None;
    let mut config = None;

    while let Some(arg) = args.next() {
        if arg == "-" || !arg.starts_with('-') {
            positional.push(arg);
            continue;
        }

        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => {
                (flag.to_string(), Some(value.to_string()))
            }
            _ => (arg.clone(), None),
        };
        let mut value = || -> Result<String, CliError> {
            match &inline {
                Some(v) => Ok(v.clone()),
                None => args.next().ok_or_else(|| CliError::MissingValue(flag.clone())),
            }
        };

        match flag.as_str() {
            "-i" | "--indent" => indent = parse_indent(&value()?)?,
            "-u" | "--url" => url = Some(value()?),
            "--id-field" => id_field = Some(value()?),
            "--batch-size" => {
                let raw = value()?;
                let n = raw.parse::<usize>().map_err(|_| CliError::InvalidNumber {
                    option: flag.clone(),
                    value: raw.clone(),
                })?;
                batch_size = Some(n);
            }
            "-c" | "--config" => config = Some(value()?),
            _ => return Err(CliError::UnexpectedArgument(arg)),
        }
    }

    if let Some(path) = config {
        if let Some(extra) = positional.into_iter().next() {
            return Err(CliError::UnexpectedArgument(extra));
        }
        return Ok(Command::Config(path));
    }

    let mut positional = positional.into_iter();
    let kind = parse_transform(&positional.next().ok_or(CliError::NoTransform)?)?;
    let source = positional.next().ok_or(CliError::NoSource)?;
    let target = positional.next().ok_or(CliError::NoTarget)?;
    if let Some(extra) = positional.next() {
        return Err(CliError::UnexpectedArgument(extra));
    }

    Ok(Command::Run(TransformArgs {
        kind,
        source,
        target,
        indent,
        url,
        id_field,
        batch_size,
    }))
}
