//! # Error Handling
//!
//! Centralized error types for Bookshelf core.
//! Uses `thiserror` for ergonomic error definitions.
//!
//! Every variant knows the HTTP status it surfaces as, so handlers can
//! propagate with `?` and let the server render the response.

use crate::validation::ValidationErrors;
use hyper::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

/// Result type alias for Bookshelf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the Bookshelf runtime
#[derive(Error, Debug)]
pub enum Error {
    /// Server failed to bind to the specified address
    #[error("Failed to bind server to {address}: {source}")]
    BindError {
        /// The address we tried to bind to
        address: String,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Router failed to match the requested path
    #[error("No route found for path: {path}")]
    RouteNotFound {
        /// The path that wasn't matched
        path: String,
    },

    /// The path exists but not for the requested method
    #[error("Method {method} not allowed for path: {path}")]
    MethodNotAllowed {
        /// The request method
        method: String,
        /// The matched path
        path: String,
    },

    /// Invalid route pattern provided
    #[error("Invalid route pattern: {pattern}: {reason}")]
    InvalidRoutePattern {
        /// The invalid pattern
        pattern: String,
        /// Reason for invalidity
        reason: String,
    },

    /// A path segment could not be parsed as a document identifier
    #[error("Invalid identifier '{value}': {reason}")]
    InvalidIdentifier {
        /// The raw identifier text
        value: String,
        /// Why parsing failed
        reason: String,
    },

    /// Request body failed schema validation
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// No document matched the requested identifier
    #[error("{resource} not found")]
    NotFound {
        /// Resource name used in the response detail (e.g. "Book")
        resource: &'static str,
    },

    /// A stored document is missing a field the record requires
    #[error("Stored document {id} is missing field '{field}'")]
    Mapping {
        /// Identifier of the corrupt document
        id: String,
        /// The missing or mistyped field
        field: &'static str,
    },

    /// HTTP protocol error
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error
    #[error("Database error: {message}")]
    Database {
        /// Error message from database
        message: String,
    },

    /// Request payload too large
    #[error("Payload too large: limit={limit} bytes, received={actual} bytes")]
    PayloadTooLarge {
        /// Max allowed size
        limit: usize,
        /// Actual size
        actual: usize,
    },
}

impl Error {
    /// Wrap a driver error with a short description of the failed operation
    pub fn database(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Database {
            message: format!("{context}: {err}"),
        }
    }

    /// HTTP status this error is reported with
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidIdentifier { .. } => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound { .. } | Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::BindError { .. }
            | Self::InvalidRoutePattern { .. }
            | Self::Mapping { .. }
            | Self::Http(_)
            | Self::Json(_)
            | Self::Io(_)
            | Self::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the error is the server's fault rather than the client's
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// JSON body sent to the client: `{"detail": ...}`
    ///
    /// Server-side causes are not exposed.
    #[must_use]
    pub fn to_body(&self) -> Value {
        let detail = match self {
            Self::Validation(errors) => json!(errors.errors),
            Self::NotFound { resource } => json!(format!("{resource} not found")),
            Self::RouteNotFound { .. } => json!("Not Found"),
            Self::MethodNotAllowed { .. } => json!("Method Not Allowed"),
            Self::PayloadTooLarge { .. } => json!("Payload Too Large"),
            Self::InvalidIdentifier { .. } => json!(self.to_string()),
            _ => json!("Internal Server Error"),
        };
        json!({ "detail": detail })
    }
}
