//! # Core Type Definitions
//!
//! This module contains the raw record model and shared types:
//! - Record identifiers (`DbId`, `SourceIds`)
//! - Raw source documents (`Record`)
//! - Error types (`BelError`)
//!
//! ## Record Shape
//!
//! Records keep a handful of typed header fields (`dbId`, `stId`,
//! `stIdVersion`, `className`, `schemaClass`, `displayName`) and carry every
//! other domain field untouched in `fields`. References to other records
//! appear either as a bare integer id or as an object holding `dbId`, singly
//! or in a list; the accessors here accept all of those shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Numeric id of a record in the source database.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct DbId(pub u64);

impl fmt::Display for DbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The source identifiers carried by every resolved node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct SourceIds {
    /// Numeric record id.
    pub db_id: DbId,
    /// Stable id, e.g. `R-HSA-445813`.
    pub st_id: String,
    /// Versioned stable id, e.g. `R-HSA-445813.2`.
    pub st_id_version: String,
}

// =============================================================================
// RECORD
// =============================================================================

/// One document from the source pathway database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default)]
    pub db_id: DbId,
    #[serde(default)]
    pub st_id: String,
    #[serde(default)]
    pub st_id_version: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub schema_class: String,
    #[serde(default)]
    pub display_name: String,
    /// Every remaining domain field.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Build a record from a JSON value.
    pub fn from_value(value: Value) -> Result<Self, BelError> {
        serde_json::from_value(value).map_err(|e| BelError::SerializationError(e.to_string()))
    }

    /// Parse a dump of records: a JSON array, or one JSON object per line.
    pub fn parse_many(text: &str) -> Result<Vec<Self>, BelError> {
        let trimmed = text.trim_start();
        if trimmed.starts_with('[') {
            return serde_json::from_str(trimmed)
                .map_err(|e| BelError::SerializationError(e.to_string()));
        }

        let mut records = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record = serde_json::from_str(line).map_err(|e| {
                BelError::SerializationError(format!("line {}: {}", line_no + 1, e))
            })?;
            records.push(record);
        }
        Ok(records)
    }

    /// The identifiers every resolved node carries back to its source.
    pub fn source_ids(&self) -> SourceIds {
        SourceIds {
            db_id: self.db_id,
            st_id: self.st_id.clone(),
            st_id_version: self.st_id_version.clone(),
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Every value stored under `key`, flattening a list into its items.
    pub fn values(&self, key: &str) -> Vec<&Value> {
        match self.fields.get(key) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![other],
        }
    }

    /// The record ids referenced under `key`, in source order.
    pub fn refs(&self, key: &str) -> Vec<DbId> {
        self.values(key).into_iter().filter_map(value_ref).collect()
    }

    /// The first record id referenced under `key`.
    pub fn first_ref(&self, key: &str) -> Option<DbId> {
        self.values(key).into_iter().find_map(value_ref)
    }

    /// The first string stored under `key`, whether scalar or list.
    pub fn first_str(&self, key: &str) -> Option<&str> {
        self.values(key).into_iter().find_map(Value::as_str)
    }

    /// The first identifier-like value under `key` as text.
    ///
    /// Accepts strings and integers, e.g. `"P31749"` or `30212`.
    pub fn first_text(&self, key: &str) -> Option<String> {
        self.values(key).into_iter().find_map(value_text)
    }

    /// `name[0]`, the record's preferred label.
    pub fn first_name(&self) -> Option<&str> {
        self.first_str("name")
    }

    /// An integer field, accepting numeric strings.
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.fields.get(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Whether the record describes a reaction-like event.
    pub fn is_reaction_like(&self) -> bool {
        crate::primitives::REACTION_SCHEMA_CLASSES.contains(&self.schema_class.as_str())
    }
}

/// Extract a record id from a bare integer or an object holding `dbId`.
pub fn value_ref(value: &Value) -> Option<DbId> {
    match value {
        Value::Number(n) => n.as_u64().map(DbId),
        Value::Object(map) => map.get("dbId").and_then(Value::as_u64).map(DbId),
        Value::String(s) => s.trim().parse().ok().map(DbId),
        _ => None,
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while translating records.
///
/// - Per-component failures never abort a whole batch
/// - Use `Result<T, BelError>` for fallible operations
/// - The engine should never panic; all errors must be recoverable
#[derive(Debug, Error)]
pub enum BelError {
    /// The requested record is absent from the store.
    #[error("Record not found: {0}")]
    RecordNotFound(DbId),

    /// Resolution revisited a record already on the in-progress chain.
    #[error("Cycle detected resolving {id}: chain {chain:?}")]
    Cycle { id: DbId, chain: Vec<DbId> },

    /// A record is missing a field it cannot be translated without.
    #[error("Malformed record {0}: {1}")]
    MalformedRecord(DbId, String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O or database error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// =============================================================================
// TESTS
// =============================================================================
