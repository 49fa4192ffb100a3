//! # Bookshelf Core
//!
//! Core library for the Bookshelf service: a JSON-over-HTTP CRUD API for a
//! single document collection of books.
//!
//! ## Architecture
//!
//! A Tokio/Hyper server dispatches requests through a radix-trie router to
//! async handlers. Handlers validate the body, call the document store and
//! map stored documents to wire records. The store is a [`Collection`]
//! built explicitly at startup and shared by every handler.
//!
//! ## Modules
//!
//! - `server` - HTTP server built on Hyper
//! - `router` - Routing using matchit (radix trie)
//! - `route` - Route metadata and information
//! - `types` - Typed path parameters
//! - `request` - HTTP request wrapper
//! - `middleware` - Request/response middleware system
//! - `json` - JSON parsing with simd-json
//! - `validation` - Structured validation errors
//! - `database` - SQLx database connectivity (SQLite, PostgreSQL)
//! - `document` - Documents and store-native identifiers
//! - `store` - Document collection operations
//! - `book` - Book models and record mapping
//! - `handlers` - The five book endpoints
//! - `error` - Error types and handling

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod book;
pub mod database;
pub mod document;
pub mod error;
pub mod handlers;
pub mod json;
pub mod middleware;
pub mod request;
pub mod route;
pub mod router;
pub mod server;
pub mod store;
pub mod types;
pub mod validation;

pub use book::{to_record, Book, BookRecord, DeleteConfirmation};
pub use database::{DatabasePool, StoreConfig};
pub use document::{Document, DocumentId, UpdateResult};
pub use error::{Error, Result};
pub use middleware::{LoggingMiddleware, Middleware, MiddlewareChain, TimingMiddleware};
pub use request::HttpRequest;
pub use route::RouteInfo;
pub use router::{Method, Router};
pub use server::{HttpResponse, Server, ServerConfig};
pub use store::Collection;
pub use types::{ParamType, ParamValue};
pub use validation::{FieldError, ValidationCode, ValidationErrors, ValidationResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Connect to the configured store and make sure its collection exists
///
/// # Errors
///
/// Returns `Error::Database` if the connection or table creation fails.
pub async fn open_store(config: &StoreConfig) -> Result<Collection> {
    let pool = DatabasePool::connect(&config.url, Some(config.max_connections)).await?;
    let collection = Collection::new(pool, config.collection.clone())?;
    collection.ensure_created().await?;
    Ok(collection)
}
