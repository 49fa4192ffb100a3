//! Command-line and environment configuration

use bookshelf_core::database::DEFAULT_MAX_CONNECTIONS;
use bookshelf_core::{ServerConfig, StoreConfig};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Human-readable lines
    Pretty,
}

/// Bookshelf HTTP CRUD service
#[derive(Parser, Debug)]
#[command(name = "bookshelf")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "BOOKSHELF_ADDR", default_value = "127.0.0.1:8000")]
    pub addr: SocketAddr,

    /// Database URL (sqlite:... or postgres://...)
    #[arg(long, env = "BOOKSHELF_DATABASE_URL", default_value = "sqlite://books.db?mode=rwc")]
    pub database_url: String,

    /// Maximum database connections
    #[arg(long, env = "BOOKSHELF_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,

    /// Collection (table) holding the books
    #[arg(long, env = "BOOKSHELF_COLLECTION", default_value = "books_collection")]
    pub collection: String,

    /// Maximum request body size in bytes
    #[arg(long, env = "BOOKSHELF_MAX_BODY_SIZE", default_value_t = 1024 * 1024)]
    pub max_body_size: usize,

    /// Seconds to wait for open connections on shutdown
    #[arg(long, env = "BOOKSHELF_SHUTDOWN_TIMEOUT", default_value_t = 30)]
    pub shutdown_timeout: u64,

    /// Log output format
    #[arg(long, env = "BOOKSHELF_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

impl Args {
    /// HTTP server settings
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            address: self.addr,
            max_body_size: self.max_body_size,
            shutdown_timeout: Duration::from_secs(self.shutdown_timeout),
            ..ServerConfig::default()
        }
    }

    /// Document store settings
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            url: self.database_url.clone(),
            max_connections: self.max_connections,
            collection: self.collection.clone(),
        }
    }
}
