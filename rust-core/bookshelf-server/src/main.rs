//! Bookshelf server
//!
//! Parses configuration, connects the document store and serves the book
//! routes until Ctrl-C.

use anyhow::Context;
use bookshelf_core::{handlers, LoggingMiddleware, Server, TimingMiddleware};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod args;

use args::{Args, LogFormat};

/// Initialize tracing; `RUST_LOG` overrides the default filter
fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new("bookshelf=info,bookshelf_core=info,bookshelf_server=info")?,
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format)?;

    let store_config = args.store_config();
    let store = bookshelf_core::open_store(&store_config)
        .await
        .with_context(|| format!("failed to open store at {}", store_config.url))?;
    info!(
        collection = %store.name(),
        backend = store.pool().backend(),
        "Document store ready"
    );
    let store = Arc::new(store);

    let mut server = Server::new(args.server_config());
    server.add_middleware(LoggingMiddleware::new());
    server.add_middleware(TimingMiddleware::new());
    handlers::register(&mut server, store.clone()).context("failed to register routes")?;

    info!(version = bookshelf_core::VERSION, "Starting bookshelf");
    let served = server.serve().await;

    store.pool().close().await;
    info!("Database pool closed");
    served.context("server error")
}
