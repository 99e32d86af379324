//! Output fragment formatting.
//!
//! Records are serialized one at a time and joined into a JSON array by
//! hand, so the array brackets, separators and element indentation are
//! produced here rather than by serde_json.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Opening of an array container.
pub const ARRAY_OPEN: &str = "[";

/// Closing of an array container.
pub const ARRAY_CLOSE: &str = "\n]\n";

/// Output indentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indent {
    /// Compact output on a single line
    #[default]
    None,
    /// Indent each level by this many spaces
    Spaces(u8),
    /// Indent each level by one tab
    Tab,
}

impl Indent {
    /// Parse an indent option: a number of spaces, or `tabs`.
    ///
    /// `0` is the same as no indentation.
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("tabs") || s.eq_ignore_ascii_case("tab") {
            return Some(Indent::Tab);
        }
        match s.parse::<u8>().ok()? {
            0 => Some(Indent::None),
            n => Some(Indent::Spaces(n)),
        }
    }

    /// The whitespace for one indentation level.
    pub fn lead(&self) -> String {
        match self {
            Indent::None => String::new(),
            Indent::Spaces(n) => " ".repeat(usize::from(*n)),
            Indent::Tab => "\t".to_string(),
        }
    }
}

impl std::fmt::Display for Indent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Indent::None => write!(f, "0"),
            Indent::Spaces(n) => write!(f, "{n}"),
            Indent::Tab => write!(f, "tabs"),
        }
    }
}

/// Serialize a value to JSON text using `indent`.
pub fn to_json_text<T: Serialize>(value: &T, indent: Indent) -> Result<String, serde_json::Error> {
    if indent == Indent::None {
        return serde_json::to_string(value);
    }

    let lead = indent.lead();
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(lead.as_bytes());
    let mut ser = Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut ser)?;
    // serde_json only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Turn serialized text into an array element fragment.
///
/// Every line is indented by one level, and the fragment is prefixed with
/// `\n` when it is the first element or `,\n` otherwise.
pub fn array_element(text: &str, indent: Indent, first: bool) -> String {
    let lead = indent.lead();
    let separator = if first { "\n" } else { ",\n" };
    let body = text.replace('\n', &format!("\n{lead}"));
    format!("{separator}{lead}{body}")
}
