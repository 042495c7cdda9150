//! SQLite backend implementation.
//!
//! In-memory databases suit tests and the CLI's throwaway runs; file-based
//! databases are the normal deployment.
//!
//! # Example
//!
//! ```no_run
//! use bookstore_persistence::backends::sqlite::SqliteBackend;
//! use bookstore_persistence::core::EntityStorage;
//! use bookstore_persistence::types::EntityKind;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::in_memory()?;
//! backend.init_schema()?;
//!
//! let author = backend
//!     .create(EntityKind::Author, Some("AU01".into()), json!({"name": "Le Guin"}))
//!     .await?;
//! assert_eq!(author.id(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! All kinds share one `entities` table keyed by `(kind, id)`. Payloads are
//! JSON text; search and filters reach into them with `json_extract`. Every
//! write runs in an IMMEDIATE transaction.

mod backend;
mod query_builder;
mod schema;
mod storage;

pub use backend::{SqliteBackend, SqliteBackendConfig};
pub use query_builder::escape_like;
pub use schema::SCHEMA_VERSION;
