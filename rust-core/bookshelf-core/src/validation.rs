//! # Validation Module
//!
//! Structured validation errors for request bodies.
//!
//! Validation is primitive type-checking: a body must be a JSON object and
//! each declared field must be present with the declared type. All failures
//! in one body are collected so the client sees them together.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Error code for categorizing validation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    /// Required field is missing
    Required,
    /// Value is invalid type
    InvalidType,
    /// Value is too short
    TooShort,
    /// Value doesn't match the expected format (e.g. body is not JSON)
    InvalidFormat,
}

/// A single validation error for a specific field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name (e.g., "title", or "body" for the whole payload)
    pub field: String,
    /// Human-readable error message
    pub message: String,
    /// Machine-readable error code
    pub code: ValidationCode,
}

impl FieldError {
    /// Create a new field error
    pub fn new(field: impl Into<String>, message: impl Into<String>, code: ValidationCode) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code,
        }
    }

    /// Create a "required field" error
    pub fn required(field: impl Into<String>) -> Self {
        let field_str = field.into();
        Self {
            message: format!("{field_str} is required"),
            field: field_str,
            code: ValidationCode::Required,
        }
    }

    /// Create an "invalid type" error
    pub fn invalid_type(field: impl Into<String>, expected: &str) -> Self {
        let field_str = field.into();
        Self {
            message: format!("{field_str} must be {expected}"),
            field: field_str,
            code: ValidationCode::InvalidType,
        }
    }

    /// Create a "too short" error
    pub fn too_short(field: impl Into<String>, min: usize) -> Self {
        let field_str = field.into();
        Self {
            message: format!("{field_str} must be at least {min} characters"),
            field: field_str,
            code: ValidationCode::TooShort,
        }
    }

    /// Create an "invalid format" error
    pub fn invalid_format(field: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::new(field, reason.to_string(), ValidationCode::InvalidFormat)
    }
}

/// Collection of validation errors
///
/// Allows aggregating multiple field errors for a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    /// List of field-level errors
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Create an empty error collection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field error
    pub fn add(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    /// Add a required field error
    pub fn add_required(&mut self, field: impl Into<String>) {
        self.add(FieldError::required(field));
    }

    /// Check if there are any errors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// `Ok(value)` when nothing was collected, otherwise the collected errors
    ///
    /// # Errors
    ///
    /// Returns `self` if at least one field error was added.
    pub fn into_result<T>(self, value: T) -> ValidationResult<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = std::result::Result<T, ValidationErrors>;

/// Read a required, non-empty string field from a JSON object
///
/// Records a field error and returns `None` when the field is absent,
/// is not a string, or is empty.
pub fn required_string(
    object: &Map<String, Value>,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match object.get(field) {
        None | Some(Value::Null) => {
            errors.add_required(field);
            None
        }
        Some(Value::String(s)) if s.is_empty() => {
            errors.add(FieldError::too_short(field, 1));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.add(FieldError::invalid_type(field, "a string"));
            None
        }
    }
}
