//! # Book Handlers
//!
//! One async function per endpoint. Each takes the shared [`Collection`]
//! explicitly; [`register`] binds them to routes on a [`Server`].
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | POST | `/books/` | [`create_book`] |
//! | GET | `/books/` | [`list_books`] |
//! | GET | `/books/{book_id}` | [`get_book`] |
//! | PUT | `/books/{book_id}` | [`update_book`] |
//! | DELETE | `/books/{book_id}` | [`delete_book`] |

use crate::book::{to_record, Book, BookRecord, DeleteConfirmation, RESOURCE};
use crate::document::DocumentId;
use crate::error::{Error, Result};
use crate::request::HttpRequest;
use crate::router::{Match, Method};
use crate::server::{handler, HttpResponse, Server};
use crate::store::Collection;
use std::sync::Arc;
use tracing::info;

/// Collection routes
pub const BOOKS_PATH: &str = "/books/";
/// Single-book routes
pub const BOOK_PATH: &str = "/books/{book_id:id}";

const BOOK_ID: &str = "book_id";

const fn not_found() -> Error {
    Error::NotFound { resource: RESOURCE }
}

/// Insert a new book and return it with its assigned id
///
/// # Errors
///
/// Returns the store error, or `Error::NotFound` if the document vanished
/// before it could be read back.
pub async fn create_book(store: &Collection, book: Book) -> Result<BookRecord> {
    let id = store.insert_one(&book.to_fields()).await?;
    let document = store.find_one(id).await?.ok_or_else(not_found)?;
    let record = to_record(&document)?;
    info!(book_id = %record.id, "Book created");
    Ok(record)
}

/// Every book in the collection, in store order
///
/// # Errors
///
/// Returns the store error or a mapping error for a corrupt document.
pub async fn list_books(store: &Collection) -> Result<Vec<BookRecord>> {
    store.find_many().await?.iter().map(to_record).collect()
}

/// One book by id
///
/// # Errors
///
/// Returns `Error::NotFound` if no book has this id.
pub async fn get_book(store: &Collection, id: DocumentId) -> Result<BookRecord> {
    let document = store.find_one(id).await?.ok_or_else(not_found)?;
    to_record(&document)
}

/// Replace a book's content, keeping its id
///
/// An update to identical content succeeds.
///
/// # Errors
///
/// Returns `Error::NotFound` if no book has this id.
pub async fn update_book(store: &Collection, id: DocumentId, book: Book) -> Result<BookRecord> {
    let result = store.update_one(id, &book.to_fields()).await?;
    if result.matched_count == 0 {
        return Err(not_found());
    }

    let document = store.find_one(id).await?.ok_or_else(not_found)?;
    info!(book_id = %id, modified = result.modified_count, "Book updated");
    to_record(&document)
}

/// Remove a book
///
/// # Errors
///
/// Returns `Error::NotFound` if no book has this id.
pub async fn delete_book(store: &Collection, id: DocumentId) -> Result<DeleteConfirmation> {
    if store.delete_one(id).await? == 0 {
        return Err(not_found());
    }
    info!(book_id = %id, "Book deleted");
    Ok(DeleteConfirmation::default())
}

fn book_body(req: &HttpRequest) -> Result<Book> {
    Book::from_json(&req.json()?).map_err(Error::Validation)
}

/// Register the five book routes on `server`
///
/// # Errors
///
/// Returns `Error::InvalidRoutePattern` if the routes clash with ones
/// already registered.
pub fn register(server: &mut Server, store: Arc<Collection>) -> Result<()> {
    let s = store.clone();
    server.add_route(
        Method::Post,
        BOOKS_PATH,
        handler(move |req: &HttpRequest, _: &Match| {
            let store = s.clone();
            let book = book_body(req);
            async move { HttpResponse::ok(&create_book(&store, book?).await?) }
        }),
    )?;

    let s = store.clone();
    server.add_route(
        Method::Get,
        BOOKS_PATH,
        handler(move |_: &HttpRequest, _: &Match| {
            let store = s.clone();
            async move { HttpResponse::ok(&list_books(&store).await?) }
        }),
    )?;

    let s = store.clone();
    server.add_route(
        Method::Get,
        BOOK_PATH,
        handler(move |_: &HttpRequest, m: &Match| {
            let store = s.clone();
            let id = m.id(BOOK_ID);
            async move { HttpResponse::ok(&get_book(&store, id?).await?) }
        }),
    )?;

    let s = store.clone();
    server.add_route(
        Method::Put,
        BOOK_PATH,
        handler(move |req: &HttpRequest, m: &Match| {
            let store = s.clone();
            let id = m.id(BOOK_ID);
            let book = book_body(req);
            async move { HttpResponse::ok(&update_book(&store, id?, book?).await?) }
        }),
    )?;

    server.add_route(
        Method::Delete,
        BOOK_PATH,
        handler(move |_: &HttpRequest, m: &Match| {
            let store = store.clone();
            let id = m.id(BOOK_ID);
            async move { HttpResponse::ok(&delete_book(&store, id?).await?) }
        }),
    )?;

    Ok(())
}
