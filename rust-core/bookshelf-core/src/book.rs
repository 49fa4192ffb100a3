//! # Books
//!
//! Wire types for the books collection and the mapping between them and
//! stored documents.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::validation::{required_string, FieldError, ValidationErrors, ValidationResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Resource name used in not-found details
pub const RESOURCE: &str = "Book";

const TITLE: &str = "title";
const AUTHOR: &str = "author";
const SUMMARY: &str = "summary";

/// Book content as accepted on create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Title
    pub title: String,
    /// Author
    pub author: String,
    /// Summary
    pub summary: String,
}

impl Book {
    /// Validate a request body into a `Book`
    ///
    /// Unknown fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns every field error found: body not an object, or a field
    /// missing, not a string, or empty.
    pub fn from_json(value: &Value) -> ValidationResult<Self> {
        let mut errors = ValidationErrors::new();
        let Value::Object(object) = value else {
            errors.add(FieldError::invalid_type("body", "an object"));
            return Err(errors);
        };

        let title = required_string(object, TITLE, &mut errors);
        let author = required_string(object, AUTHOR, &mut errors);
        let summary = required_string(object, SUMMARY, &mut errors);

        match (title, author, summary) {
            (Some(title), Some(author), Some(summary)) => errors.into_result(Self {
                title,
                author,
                summary,
            }),
            _ => Err(errors),
        }
    }

    /// The stored document body: exactly the three content fields
    #[must_use]
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::with_capacity(3);
        fields.insert(TITLE.to_string(), Value::String(self.title.clone()));
        fields.insert(AUTHOR.to_string(), Value::String(self.author.clone()));
        fields.insert(SUMMARY.to_string(), Value::String(self.summary.clone()));
        fields
    }
}

/// A persisted book as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Store-assigned identifier, string form
    pub id: String,
    /// Title
    pub title: String,
    /// Author
    pub author: String,
    /// Summary
    pub summary: String,
}

/// Body returned by a successful delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    /// Human-readable confirmation
    pub message: String,
}

impl Default for DeleteConfirmation {
    fn default() -> Self {
        Self {
            message: "Book deleted successfully".to_string(),
        }
    }
}

/// Map a stored document to its wire record
///
/// # Errors
///
/// Returns `Error::Mapping` if a content field is absent or not a string.
pub fn to_record(document: &Document) -> Result<BookRecord> {
    let field = |name: &'static str| {
        document
            .get_str(name)
            .map(str::to_string)
            .ok_or_else(|| Error::Mapping {
                id: document.id.to_string(),
                field: name,
            })
    };

    Ok(BookRecord {
        id: document.id.to_string(),
        title: field(TITLE)?,
        author: field(AUTHOR)?,
        summary: field(SUMMARY)?,
    })
}
