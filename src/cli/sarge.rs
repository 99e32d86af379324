use sarge::ArgumentType;

use crate::cli::{CliError, parse_indent, parse_transform};
use crate::format::Indent;
use crate::transform::TransformKind;

impl ArgumentType for Indent {
    type Error = CliError;

    const REPEATABLE: bool = false;

    fn from_value(val: Option<&str>) -> sarge::ArgResult<Self> {
        // a bare `--indent` keeps the default
        Some(val.map_or(Ok(Indent::None), parse_indent))
    }

    fn default_value() -> Option<Self> {
        Some(Indent::None)
    }
}

impl ArgumentType for TransformKind {
    type Error = CliError;

    const REPEATABLE: bool = false;

    fn from_value(val: Option<&str>) -> sarge::ArgResult<Self> {
        Some(val.ok_or(CliError::NoTransform).and_then(parse_transform))
    }
}
