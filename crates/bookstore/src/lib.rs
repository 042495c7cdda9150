//! Bookstore command-line front end.
//!
//! Wires [`AppConfig`] to a SQLite-backed [`Catalog`] and runs one
//! [`Command`] per invocation, printing the result as JSON.

pub mod cli;
pub mod commands;
pub mod config;

use bookstore_persistence::Catalog;
use bookstore_persistence::backends::sqlite::SqliteBackend;
use bookstore_persistence::codegen::CodeGenerator;
use std::sync::Arc;
use tracing::info;

pub use cli::{Cli, Command};
pub use commands::run;
pub use config::AppConfig;

/// Opens the configured database, creates the schema if needed and builds
/// the catalog with the configured code prefixes.
pub fn open_catalog(config: &AppConfig) -> anyhow::Result<Catalog<SqliteBackend>> {
    info!(database = %config.database_url, "Opening SQLite database");

    let backend = SqliteBackend::with_config(&config.database_url, config.backend_config())?;
    backend.init_schema()?;

    let codes = CodeGenerator::new(config.prefix_registry()?);
    Ok(Catalog::with_codes(Arc::new(backend), codes))
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("bookstore={},bookstore_persistence={}", level, level))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
