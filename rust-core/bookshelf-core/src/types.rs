//! # Path Parameter Types
//!
//! Typed path parameters declared in route patterns as `{name:type}`.
//! Conversion happens at match time, so a malformed identifier is rejected
//! before any handler runs.

use crate::document::DocumentId;
use crate::error::Result;
use std::fmt;

/// Supported path parameter types
///
/// Default is `String`, which performs no conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamType {
    /// String type (default) - no conversion
    #[default]
    String,
    /// Document identifier - parses to `DocumentId`
    Id,
}

impl ParamType {
    /// Parse type specifier from route pattern (e.g., "id" from "{book_id:id}")
    #[must_use]
    pub fn from_specifier(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "id" | "uuid" => Self::Id,
            _ => Self::String,
        }
    }

    /// Get the type name for error messages
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Id => "id",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Converted parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// String value (no conversion performed)
    String(String),
    /// Parsed document identifier
    Id(DocumentId),
}

impl ParamValue {
    /// Get the value as a string
    #[must_use]
    pub fn as_string(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Id(id) => id.to_string(),
        }
    }

    /// Get as `DocumentId` if Id variant
    #[must_use]
    pub const fn as_id(&self) -> Option<DocumentId> {
        match self {
            Self::Id(id) => Some(*id),
            Self::String(_) => None,
        }
    }
}

/// Convert raw string to typed value based on `ParamType`
///
/// # Errors
///
/// Returns `Error::InvalidIdentifier` if an `Id` parameter is malformed.
pub fn convert_param(raw: &str, param_type: ParamType) -> Result<ParamValue> {
    match param_type {
        ParamType::String => Ok(ParamValue::String(raw.to_string())),
        ParamType::Id => DocumentId::parse(raw).map(ParamValue::Id),
    }
}

/// Parse a path segment pattern to extract name and type
///
/// Examples:
/// - `{slug}` -> ("slug", ParamType::String)
/// - `{book_id:id}` -> ("book_id", ParamType::Id)
///
/// # Returns
///
/// `Some((name, type))` if pattern is a parameter, `None` if static segment.
#[must_use]
pub fn parse_param_pattern(segment: &str) -> Option<(String, ParamType)> {
    let inner = segment.strip_prefix('{')?.strip_suffix('}')?;

    if let Some((name, type_spec)) = inner.split_once(':') {
        Some((name.to_string(), ParamType::from_specifier(type_spec)))
    } else {
        Some((inner.to_string(), ParamType::String))
    }
}
