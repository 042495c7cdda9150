//! Bookstore Persistence Layer
//!
//! This crate stores bookstore entities (authors, books, categories, users,
//! purchases, transactions, favorites) and provides the two pieces every
//! listing and every insert goes through: offset pagination with multi-field
//! substring search, and per-kind human-readable codes.
//!
//! # Features
//!
//! - **Pagination and search**: `page`/`limit` parsing, case-insensitive
//!   "contains" search across fields joined with AND or OR
//! - **Entity codes**: `AU01`, `BO07`, `TST12`, allocated atomically with
//!   the insert
//! - **Soft deletes**: deleted rows stay in storage and keep counting for
//!   codes
//! - **Atomic batches**: multi-row writes (buying a book, checking out
//!   purchases) commit together or not at all
//!
//! Available backend features:
//! - `sqlite` (default) - SQLite with in-memory and file modes
//!
//! # Architecture
//!
//! - [`types`] - Entity kinds, stored entity envelope, pagination types
//! - [`error`] - Error types for all operations
//! - [`core`] - Storage traits
//! - [`query`] - Backend-neutral row filters
//! - [`paginator`] - Paginate and search any entity kind
//! - [`codegen`] - Code prefixes and generation
//! - [`model`] - Entity payloads
//! - [`catalog`] - Bookstore operations on top of storage
//! - [`backends`] - Backend implementations
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bookstore_persistence::backends::sqlite::SqliteBackend;
//! use bookstore_persistence::catalog::Catalog;
//! use bookstore_persistence::model::{Author, Book};
//! use bookstore_persistence::types::QueryParams;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::in_memory()?;
//! backend.init_schema()?;
//! let catalog = Catalog::new(Arc::new(backend));
//!
//! let author = catalog.create_author(Author::new("Ursula K. Le Guin")).await?;
//! assert_eq!(author.code(), Some("AU01"));
//!
//! catalog
//!     .create_book(Book::new("The Dispossessed", author.id()))
//!     .await?;
//!
//! let params = QueryParams::parse("page=1&limit=10&search=dispossessed&search_fields=title");
//! let page = catalog.list_books(&params).await?;
//! assert_eq!(page.total_items, 1);
//! # Ok(())
//! # }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod catalog;
pub mod codegen;
pub mod core;
pub mod error;
pub mod model;
pub mod paginator;
pub mod query;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};
pub use types::{EntityKind, EntityRecord, PageRequest, Paginated, QueryParams, StoredEntity};

// Re-export core traits
pub use core::{AtomicWrites, Backend, BackendKind, EntityStorage};

pub use catalog::Catalog;
pub use codegen::{CodeGenerator, PrefixRegistry};
pub use paginator::paginate_and_search;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
