//! # Documents
//!
//! Schemaless documents as the store sees them, and the store-native
//! identifier that addresses them.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Store-assigned document identifier
///
/// Random v4 UUIDs: generated once per insert and never reissued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a fresh identifier
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the textual form of an identifier
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidIdentifier` if `raw` is not a well-formed UUID.
    pub fn parse(raw: &str) -> Result<Self> {
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|e| Error::InvalidIdentifier {
                value: raw.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for DocumentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A stored document: its identifier plus arbitrary JSON fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Identifier assigned at insert
    pub id: DocumentId,
    /// Document body
    pub fields: Map<String, Value>,
}

impl Document {
    /// Look up a string field
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

/// Outcome of an update by identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    /// Documents matching the filter (0 or 1)
    pub matched_count: u64,
    /// Documents whose content actually changed (0 or 1)
    pub modified_count: u64,
}
