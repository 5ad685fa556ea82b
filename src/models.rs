// ==============================================================================
// models.rs - Variant Data Models
// ==============================================================================
// Description: Variant records, the in-memory table and API response models
// Author: Matt Barham
// Created: 2026-10-17
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Column holding the chromosome after the `#CHROM` header is normalised
pub const CHROM_COLUMN: &str = "CHROM";

/// Column holding the 1-based base pair position
pub const POS_COLUMN: &str = "POS";

/// Column holding the variant identifier (rsID)
pub const ID_COLUMN: &str = "ID";

/// A single cell of a variant record
///
/// Only `POS` is ever stored as an integer; every other column is kept as the
/// text found on disk so a load/save cycle reproduces the file exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
}

impl FieldValue {
    /// Interpret raw on-disk text for the given column
    pub fn from_raw(column: &str, raw: &str) -> Self {
        if column == POS_COLUMN {
            if let Some(value) = canonical_integer(raw) {
                return FieldValue::Integer(value);
            }
        }
        FieldValue::Text(raw.to_string())
    }

    /// Convert a JSON request value for the given column
    pub fn from_json(column: &str, value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) if column == POS_COLUMN => match n.as_i64() {
                Some(pos) => FieldValue::Integer(pos),
                None => FieldValue::Text(n.to_string()),
            },
            serde_json::Value::String(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Text(other.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// Parse `raw` as an integer only if printing it back yields the same text
pub fn canonical_integer(raw: &str) -> Option<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|value| value.to_string() == raw)
}

/// One row of the variant table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    /// Surrogate row index, unique within the table
    pub index: u64,

    /// Field values keyed by column name, in schema order
    pub fields: IndexMap<String, FieldValue>,
}

impl VariantRecord {
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }

    /// True if the record's ID column renders exactly as `id`
    pub fn matches_id(&self, id: &str) -> bool {
        match self.fields.get(ID_COLUMN) {
            Some(FieldValue::Text(value)) => value == id,
            Some(value @ FieldValue::Integer(_)) => value.to_string() == id,
            None => false,
        }
    }
}

/// The whole "database": a fixed ordered schema plus every row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<VariantRecord>,
}

impl Table {
    /// Next surrogate index (one past the current maximum)
    pub fn next_index(&self) -> u64 {
        self.rows
            .iter()
            .map(|row| row.index)
            .max()
            .map_or(0, |max| max + 1)
    }
}

/// Row data keyed by row index, as rendered in responses
pub type RecordData = IndexMap<String, IndexMap<String, FieldValue>>;

pub fn record_data<'a>(records: impl IntoIterator<Item = &'a VariantRecord>) -> RecordData {
    records
        .into_iter()
        .map(|record| (record.index.to_string(), record.fields.clone()))
        .collect()
}

/// Pagination metadata for a query result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub entries_per_page: usize,
    pub displayed_page: usize,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub pages: usize,
    pub entries: usize,
}

/// Successful GET body
#[derive(Debug, Serialize)]
pub struct ResultEnvelope {
    pub meta: PageMeta,
    pub data: RecordData,
}

/// POST/PUT body describing the rows that were written
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub message: String,
    pub data: RecordData,
}

/// Informational body (e.g. for 304 responses)
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// API information response
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Readiness check response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub store: bool,
    pub source: bool,
}

/// Error response
///
/// `error` is a stable machine-readable reason, `message` the human-readable
/// details (one entry per validation violation).
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: Vec<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: vec![message.into()],
        }
    }

    pub fn with_messages(error: impl Into<String>, message: Vec<String>) -> Self {
        Self {
            error: error.into(),
            message,
        }
    }
}
