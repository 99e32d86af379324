//! Per-record transformations.
//!
//! This module provides:
//! - `TransformKind`: The supported transformations and their command names
//! - `Transformer`: Applies one transformation to one record at a time
//! - `tabular_to_object`: Flattens a row into a keyed object

use serde_json::{Map, Value};
use thiserror::Error;

use crate::format::FormatKind;
use crate::ids::Identifier;
use crate::source::Record;

/// Identifier field used when none is configured.
pub const DEFAULT_ID_FIELD: &str = "_id";

/// The supported transformations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    /// Remove the identifier field
    ClearIds,
    /// Set the identifier field to a freshly issued identifier
    AddIds,
    /// Turn tabular rows into keyed objects
    Csv,
}

impl TransformKind {
    pub const ALL: [TransformKind; 3] = [
        TransformKind::ClearIds,
        TransformKind::AddIds,
        TransformKind::Csv,
    ];

    /// Parse a transformation name, including its long aliases.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clear-ids" | "clear-identifier" => Some(TransformKind::ClearIds),
            "add-ids" | "assign-identifier" => Some(TransformKind::AddIds),
            "csv" | "tabular-to-object" => Some(TransformKind::Csv),
            _ => None,
        }
    }

    /// The primary command name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformKind::ClearIds => "clear-ids",
            TransformKind::AddIds => "add-ids",
            TransformKind::Csv => "csv",
        }
    }

    /// Whether each record consumes one identifier.
    pub fn needs_identifier(&self) -> bool {
        matches!(self, TransformKind::AddIds)
    }

    /// The input format this transformation reads.
    pub fn input_format(&self) -> FormatKind {
        match self {
            TransformKind::ClearIds | TransformKind::AddIds => FormatKind::Json,
            TransformKind::Csv => FormatKind::Csv,
        }
    }
}

impl std::fmt::Display for TransformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors for a single record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("cannot set field '{field}' on a non-object document")]
    NotAnObject { field: String },

    #[error("'{kind}' expects JSON documents, got a tabular row")]
    UnexpectedRow { kind: TransformKind },

    #[error("'{kind}' expects tabular rows, got a JSON document")]
    UnexpectedDocument { kind: TransformKind },

    #[error("row arrived before the header row")]
    MissingHeader,

    #[error("no identifier supplied for '{kind}'")]
    MissingIdentifier { kind: TransformKind },
}

/// Applies one transformation to a stream of records.
///
/// Holds the header row captured from a tabular source, so a fresh
/// transformer is needed per run.
#[derive(Debug, Clone)]
pub struct Transformer {
    kind: TransformKind,
    id_field: String,
    header: Option<Vec<String>>,
}

impl Transformer {
    pub fn new(kind: TransformKind, id_field: impl Into<String>) -> Self {
        Self {
            kind,
            id_field: id_field.into(),
            header: None,
        }
    }

    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Remember the column names used for subsequent rows.
    pub fn capture_header(&mut self, header: Vec<String>) {
        self.header = Some(header);
    }

    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Transform one record.
    ///
    /// `id` must be supplied when [`TransformKind::needs_identifier`] holds.
    /// `Ok(None)` means the record produces no output.
    pub fn apply(&self, record: Record, id: Option<Identifier>) -> Result<Option<Value>, RecordError> {
        match (self.kind, record) {
            (TransformKind::ClearIds, Record::Document(doc)) => Ok(Some(self.clear_id(doc))),
            (TransformKind::AddIds, Record::Document(doc)) => {
                let id = id.ok_or(RecordError::MissingIdentifier { kind: self.kind })?;
                self.assign_id(doc, id).map(Some)
            }
            (TransformKind::Csv, Record::Row(row)) => {
                let header = self.header.as_deref().ok_or(RecordError::MissingHeader)?;
                Ok(tabular_to_object(header, &row))
            }
            (kind @ (TransformKind::ClearIds | TransformKind::AddIds), Record::Row(_)) => {
                Err(RecordError::UnexpectedRow { kind })
            }
            (kind @ TransformKind::Csv, Record::Document(_)) => {
                Err(RecordError::UnexpectedDocument { kind })
            }
        }
    }

    fn clear_id(&self, doc: Value) -> Value {
        match doc {
            Value::Object(mut map) => {
                map.shift_remove(&self.id_field);
                Value::Object(map)
            }
            other => other,
        }
    }

    fn assign_id(&self, doc: Value, id: Identifier) -> Result<Value, RecordError> {
        match doc {
            Value::Object(mut map) => {
                map.insert(self.id_field.clone(), Value::String(id));
                Ok(Value::Object(map))
            }
            _ => Err(RecordError::NotAnObject {
                field: self.id_field.clone(),
            }),
        }
    }
}

/// Map a row onto `headers`, position by position.
///
/// Empty values and columns without a (non-empty) header are left out.
/// An empty row yields `None`.
pub fn tabular_to_object(headers: &[String], row: &[String]) -> Option<Value> {
    if row.is_empty() {
        return None;
    }

    let mut map = Map::new();
    for (i, value) in row.iter().enumerate() {
        if value.is_empty() {
            continue;
        }
        match headers.get(i) {
            Some(key) if !key.is_empty() => {
                map.insert(key.clone(), Value::String(value.clone()));
            }
            _ => {}
        }
    }
    Some(Value::Object(map))
}
