//! # Document Store
//!
//! A named collection of schemaless JSON documents on top of a
//! [`DatabasePool`]. Each document lives in one row: a text primary key and
//! the JSON body. Every operation is a single statement except
//! [`Collection::update_one`], which needs a second read to tell "no such
//! document" apart from "nothing changed".

use crate::database::DatabasePool;
use crate::document::{Document, DocumentId, UpdateResult};
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use tracing::debug;

/// Handle to one document collection
#[derive(Clone, Debug)]
pub struct Collection {
    pool: DatabasePool,
    name: String,
}

impl Collection {
    /// Wrap a pool as the collection `name`
    ///
    /// # Errors
    ///
    /// Returns `Error::Database` unless `name` is a plain SQL identifier
    /// (ASCII letters, digits, underscores; not starting with a digit).
    pub fn new(pool: DatabasePool, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let valid = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(Error::Database {
                message: format!("invalid collection name '{name}'"),
            });
        }
        Ok(Self { pool, name })
    }

    /// Collection name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying pool
    #[must_use]
    pub const fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Create the backing table if it does not exist yet
    ///
    /// # Errors
    ///
    /// Returns `Error::Database` if the DDL fails.
    pub async fn ensure_created(&self) -> Result<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY, document TEXT NOT NULL)",
            self.name
        );
        self.pool.execute(&sql).await?;
        Ok(())
    }

    /// Insert a new document; the store assigns its identifier
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` or `Error::Database` if the insert fails.
    pub async fn insert_one(&self, fields: &Map<String, Value>) -> Result<DocumentId> {
        let id = DocumentId::generate();
        let body = serde_json::to_string(fields)?;

        let result = match &self.pool {
            DatabasePool::Sqlite(pool) => {
                let sql = format!("INSERT INTO {} (id, document) VALUES (?, ?)", self.name);
                sqlx::query(&sql)
                    .bind(id.to_string())
                    .bind(body.as_str())
                    .execute(pool)
                    .await
                    .map(|_| ())
            }
            DatabasePool::Postgres(pool) => {
                let sql = format!("INSERT INTO {} (id, document) VALUES ($1, $2)", self.name);
                sqlx::query(&sql)
                    .bind(id.to_string())
                    .bind(body.as_str())
                    .execute(pool)
                    .await
                    .map(|_| ())
            }
        };
        result.map_err(|e| Error::database("insert_one", e))?;

        debug!(collection = %self.name, %id, "Document inserted");
        Ok(id)
    }

    /// Fetch one document by identifier
    ///
    /// # Errors
    ///
    /// Returns `Error::Database` if the query fails or the stored row is
    /// unreadable.
    pub async fn find_one(&self, id: DocumentId) -> Result<Option<Document>> {
        let row: Option<(String, String)> = match &self.pool {
            DatabasePool::Sqlite(pool) => {
                let sql = format!("SELECT id, document FROM {} WHERE id = ?", self.name);
                sqlx::query_as::<_, (String, String)>(&sql)
                    .bind(id.to_string())
                    .fetch_optional(pool)
                    .await
            }
            DatabasePool::Postgres(pool) => {
                let sql = format!("SELECT id, document FROM {} WHERE id = $1", self.name);
                sqlx::query_as::<_, (String, String)>(&sql)
                    .bind(id.to_string())
                    .fetch_optional(pool)
                    .await
            }
        }
        .map_err(|e| Error::database("find_one", e))?;

        row.map(decode_row).transpose()
    }

    /// Fetch every document, in whatever order the backend returns them
    ///
    /// # Errors
    ///
    /// Returns `Error::Database` if the query fails or a stored row is
    /// unreadable.
    pub async fn find_many(&self) -> Result<Vec<Document>> {
        let sql = format!("SELECT id, document FROM {}", self.name);
        let rows: Vec<(String, String)> = match &self.pool {
            DatabasePool::Sqlite(pool) => {
                sqlx::query_as::<_, (String, String)>(&sql)
                    .fetch_all(pool)
                    .await
            }
            DatabasePool::Postgres(pool) => {
                sqlx::query_as::<_, (String, String)>(&sql)
                    .fetch_all(pool)
                    .await
            }
        }
        .map_err(|e| Error::database("find_many", e))?;

        rows.into_iter().map(decode_row).collect()
    }

    /// Replace the body of the document with `fields`
    ///
    /// `matched_count` says whether the document exists; `modified_count`
    /// whether its stored body actually changed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` or `Error::Database` if the update fails.
    pub async fn update_one(
        &self,
        id: DocumentId,
        fields: &Map<String, Value>,
    ) -> Result<UpdateResult> {
        let body = serde_json::to_string(fields)?;

        let modified = match &self.pool {
            DatabasePool::Sqlite(pool) => {
                let sql = format!(
                    "UPDATE {} SET document = ? WHERE id = ? AND document <> ?",
                    self.name
                );
                sqlx::query(&sql)
                    .bind(body.as_str())
                    .bind(id.to_string())
                    .bind(body.as_str())
                    .execute(pool)
                    .await
                    .map(|r| r.rows_affected())
            }
            DatabasePool::Postgres(pool) => {
                let sql = format!(
                    "UPDATE {} SET document = $1 WHERE id = $2 AND document <> $1",
                    self.name
                );
                sqlx::query(&sql)
                    .bind(body.as_str())
                    .bind(id.to_string())
                    .execute(pool)
                    .await
                    .map(|r| r.rows_affected())
            }
        }
        .map_err(|e| Error::database("update_one", e))?;

        let matched = if modified > 0 {
            modified
        } else {
            self.count_by_id(id).await?
        };

        debug!(collection = %self.name, %id, matched, modified, "Document updated");
        Ok(UpdateResult {
            matched_count: matched,
            modified_count: modified,
        })
    }

    /// Remove the document; returns how many were deleted (0 or 1)
    ///
    /// # Errors
    ///
    /// Returns `Error::Database` if the delete fails.
    pub async fn delete_one(&self, id: DocumentId) -> Result<u64> {
        let deleted = match &self.pool {
            DatabasePool::Sqlite(pool) => {
                let sql = format!("DELETE FROM {} WHERE id = ?", self.name);
                sqlx::query(&sql)
                    .bind(id.to_string())
                    .execute(pool)
                    .await
                    .map(|r| r.rows_affected())
            }
            DatabasePool::Postgres(pool) => {
                let sql = format!("DELETE FROM {} WHERE id = $1", self.name);
                sqlx::query(&sql)
                    .bind(id.to_string())
                    .execute(pool)
                    .await
                    .map(|r| r.rows_affected())
            }
        }
        .map_err(|e| Error::database("delete_one", e))?;

        debug!(collection = %self.name, %id, deleted, "Document deleted");
        Ok(deleted)
    }

    async fn count_by_id(&self, id: DocumentId) -> Result<u64> {
        let count: i64 = match &self.pool {
            DatabasePool::Sqlite(pool) => {
                let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?", self.name);
                sqlx::query_scalar::<_, i64>(&sql)
                    .bind(id.to_string())
                    .fetch_one(pool)
                    .await
            }
            DatabasePool::Postgres(pool) => {
                let sql = format!("SELECT COUNT(*) FROM {} WHERE id = $1", self.name);
                sqlx::query_scalar::<_, i64>(&sql)
                    .bind(id.to_string())
                    .fetch_one(pool)
                    .await
            }
        }
        .map_err(|e| Error::database("count", e))?;

        Ok(u64::try_from(count).unwrap_or_default())
    }
}

fn decode_row((id, body): (String, String)) -> Result<Document> {
    let id = DocumentId::parse(&id).map_err(|e| Error::database("corrupt document id", e))?;
    let fields = match serde_json::from_str(&body)? {
        Value::Object(map) => map,
        _ => {
            return Err(Error::Database {
                message: format!("document {id} is not a JSON object"),
            })
        }
    };
    Ok(Document { id, fields })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn memory_collection() -> Collection {
        let pool = DatabasePool::connect_sqlite("sqlite::memory:", Some(1))
            .await
            .unwrap();
        let collection = Collection::new(pool, "books_collection").unwrap();
        collection.ensure_created().await.unwrap();
        collection
    }

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[tokio::test]
    async fn test_collection_name_validation() {
        let pool = DatabasePool::connect_sqlite("sqlite::memory:", Some(1))
            .await
            .unwrap();
        assert!(Collection::new(pool.clone(), "books_collection").is_ok());
        assert!(Collection::new(pool.clone(), "books; DROP TABLE x").is_err());
        assert!(Collection::new(pool.clone(), "1books").is_err());
        assert!(Collection::new(pool, "").is_err());
    }

    #[tokio::test]
    async fn test_insert_and_find_one() {
        let collection = memory_collection().await;
        let doc = fields(json!({ "title": "Dune", "author": "Herbert" }));

        let id = collection.insert_one(&doc).await.unwrap();
        let found = collection.find_one(id).await.unwrap().unwrap();

        assert_eq!(found.id, id);
        assert_eq!(found.fields, doc);
    }

    #[tokio::test]
    async fn test_find_one_missing() {
        let collection = memory_collection().await;
        let found = collection.find_one(DocumentId::generate()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_find_many() {
        let collection = memory_collection().await;
        assert!(collection.find_many().await.unwrap().is_empty());

        let a = collection.insert_one(&fields(json!({ "n": 1 }))).await.unwrap();
        let b = collection.insert_one(&fields(json!({ "n": 2 }))).await.unwrap();

        let ids: Vec<DocumentId> = collection
            .find_many()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a));
        assert!(ids.contains(&b));
    }

    #[tokio::test]
    async fn test_update_counts() {
        let collection = memory_collection().await;
        let original = fields(json!({ "title": "Dune" }));
        let id = collection.insert_one(&original).await.unwrap();

        let changed = fields(json!({ "title": "Dune Messiah" }));
        let result = collection.update_one(id, &changed).await.unwrap();
        assert_eq!(result, UpdateResult { matched_count: 1, modified_count: 1 });

        let result = collection.update_one(id, &changed).await.unwrap();
        assert_eq!(result, UpdateResult { matched_count: 1, modified_count: 0 });

        let result = collection
            .update_one(DocumentId::generate(), &changed)
            .await
            .unwrap();
        assert_eq!(result, UpdateResult::default());

        let stored = collection.find_one(id).await.unwrap().unwrap();
        assert_eq!(stored.fields, changed);
    }

    #[tokio::test]
    async fn test_delete_one() {
        let collection = memory_collection().await;
        let id = collection.insert_one(&fields(json!({ "n": 1 }))).await.unwrap();

        assert_eq!(collection.delete_one(id).await.unwrap(), 1);
        assert_eq!(collection.delete_one(id).await.unwrap(), 0);
        assert!(collection.find_one(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_object_document_is_rejected() {
        let collection = memory_collection().await;
        let id = DocumentId::generate();
        collection
            .pool()
            .execute(&format!(
                "INSERT INTO books_collection (id, document) VALUES ('{id}', '[1, 2]')"
            ))
            .await
            .unwrap();

        assert!(matches!(
            collection.find_one(id).await,
            Err(Error::Database { .. })
        ));
    }
}
