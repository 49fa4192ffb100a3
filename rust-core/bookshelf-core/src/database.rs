//! # Database Module
//!
//! Async database connectivity with SQLx for PostgreSQL and SQLite.
//! The URL scheme picks the backend; everything above this module talks to
//! a [`DatabasePool`] and never to a driver type directly.

use crate::error::{Error, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

/// Default pool size when none is configured
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Connection settings for the document store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database URL (`sqlite:...` or `postgres://...`)
    pub url: String,
    /// Maximum pool size
    pub max_connections: u32,
    /// Name of the collection (table) holding the documents
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://books.db?mode=rwc".to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            collection: "books_collection".to_string(),
        }
    }
}

/// Database connection pool supporting multiple backends
#[derive(Clone, Debug)]
pub enum DatabasePool {
    /// SQLite connection pool
    Sqlite(SqlitePool),
    /// PostgreSQL connection pool
    Postgres(PgPool),
}

impl DatabasePool {
    /// Connect using the backend named by the URL scheme
    ///
    /// # Errors
    ///
    /// Returns `Error::Database` for an unsupported scheme or a failed
    /// connection.
    pub async fn connect(url: &str, max_connections: Option<u32>) -> Result<Self> {
        let pool = if url.starts_with("sqlite:") {
            Self::connect_sqlite(url, max_connections).await?
        } else if url.starts_with("postgres:") || url.starts_with("postgresql:") {
            Self::connect_postgres(url, max_connections).await?
        } else {
            let scheme = url.split(':').next().unwrap_or_default();
            return Err(Error::Database {
                message: format!("unsupported database scheme '{scheme}'"),
            });
        };

        info!(backend = pool.backend(), "Database pool connected");
        Ok(pool)
    }

    /// Connect to a SQLite database
    ///
    /// An in-memory database exists per connection, so `sqlite::memory:`
    /// should be used with `max_connections` of 1.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let pool = DatabasePool::connect_sqlite("sqlite::memory:", Some(1)).await?;
    /// let pool = DatabasePool::connect_sqlite("sqlite:books.db", Some(20)).await?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `Error::Database` if the connection fails.
    pub async fn connect_sqlite(url: &str, max_connections: Option<u32>) -> Result<Self> {
        let pool_size = max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .connect(url)
            .await
            .map_err(|e| Error::database("SQLite connection failed", e))?;

        Ok(Self::Sqlite(pool))
    }

    /// Connect to a PostgreSQL database
    ///
    /// # Example
    ///
    /// ```ignore
    /// let pool = DatabasePool::connect_postgres("postgres://localhost/books", None).await?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `Error::Database` if the connection fails.
    pub async fn connect_postgres(url: &str, max_connections: Option<u32>) -> Result<Self> {
        let pool_size = max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .connect(url)
            .await
            .map_err(|e| Error::database("PostgreSQL connection failed", e))?;

        Ok(Self::Postgres(pool))
    }

    /// Backend name for logs
    #[must_use]
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Postgres(_) => "postgres",
        }
    }

    /// Execute a statement that doesn't return rows
    ///
    /// Returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns `Error::Database` if the statement fails.
    pub async fn execute(&self, query: &str) -> Result<u64> {
        let result = match self {
            Self::Sqlite(pool) => sqlx::query(query).execute(pool).await.map(|r| r.rows_affected()),
            Self::Postgres(pool) => sqlx::query(query).execute(pool).await.map(|r| r.rows_affected()),
        };
        result.map_err(|e| Error::database("Query error", e))
    }

    /// Close the database connection pool
    pub async fn close(&self) {
        match self {
            Self::Sqlite(pool) => pool.close().await,
            Self::Postgres(pool) => pool.close().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_memory_connection() {
        let pool = DatabasePool::connect("sqlite::memory:", Some(1)).await;
        assert_eq!(pool.unwrap().backend(), "sqlite");
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let result = DatabasePool::connect("mongodb://localhost:27017", None).await;
        match result {
            Err(Error::Database { message }) => assert!(message.contains("mongodb")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sqlite_execute() {
        let pool = DatabasePool::connect_sqlite("sqlite::memory:", Some(1))
            .await
            .unwrap();

        pool.execute("CREATE TABLE shelf (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .unwrap();
        let inserted = pool
            .execute("INSERT INTO shelf (id, name) VALUES (1, 'fiction'), (2, 'poetry')")
            .await
            .unwrap();

        assert_eq!(inserted, 2);
        pool.close().await;
    }

    #[test]
    fn test_store_config_default() {
        let config = StoreConfig::default();
        assert_eq!(config.collection, "books_collection");
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(config.url.starts_with("sqlite:"));
    }
}
