//! Test fixtures for the persistence layer.
//!
//! Backends, catalogs and a small seeded bookstore.

use std::sync::Arc;

use rust_decimal::Decimal;

use bookstore_persistence::backends::sqlite::{SqliteBackend, SqliteBackendConfig};
use bookstore_persistence::catalog::Catalog;
use bookstore_persistence::model::{Author, Book, Category};
use bookstore_persistence::types::StoredEntity;

/// An initialized in-memory backend.
pub fn create_backend() -> SqliteBackend {
    let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
    backend.init_schema().expect("Failed to initialize schema");
    backend
}

/// An initialized file-backed backend with a pool of `connections`.
pub fn create_file_backend(dir: &tempfile::TempDir, connections: u32) -> SqliteBackend {
    let config = SqliteBackendConfig {
        max_connections: connections,
        ..Default::default()
    };
    let backend = SqliteBackend::with_config(dir.path().join("bookstore.db"), config)
        .expect("Failed to create SQLite backend");
    backend.init_schema().expect("Failed to initialize schema");
    backend
}

/// A catalog over a fresh in-memory backend.
pub fn create_catalog() -> Catalog<SqliteBackend> {
    Catalog::new(Arc::new(create_backend()))
}

/// A price from cents.
pub fn price(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Rows created by [`seed_bookstore`].
pub struct Seeded {
    pub tolkien: StoredEntity<Author>,
    pub le_guin: StoredEntity<Author>,
    pub fantasy: StoredEntity<Category>,
    pub hobbit: StoredEntity<Book>,
    pub silmarillion: StoredEntity<Book>,
    pub earthsea: StoredEntity<Book>,
}

/// Two authors, one category and three books.
pub async fn seed_bookstore(catalog: &Catalog<SqliteBackend>) -> Seeded {
    let tolkien = catalog
        .create_author(Author::new("J.R.R. Tolkien").with_bio("Philologist"))
        .await
        .unwrap();
    let le_guin = catalog
        .create_author(Author::new("Ursula K. Le Guin").with_bio("Wrote about tolkien's influence"))
        .await
        .unwrap();
    let fantasy = catalog
        .create_category(Category::new("Fantasy").with_description("Dragons and wizards"))
        .await
        .unwrap();

    let hobbit = catalog
        .create_book(
            Book::new("The Hobbit", tolkien.id())
                .with_description("There and back again")
                .with_price(price(1250))
                .with_stock(5)
                .with_categories([fantasy.id()]),
        )
        .await
        .unwrap();
    let silmarillion = catalog
        .create_book(
            Book::new("The Silmarillion", tolkien.id())
                .with_description("Tales of the First Age")
                .with_price(price(1800)),
        )
        .await
        .unwrap();
    let earthsea = catalog
        .create_book(
            Book::new("A Wizard of Earthsea", le_guin.id())
                .with_description("A tolkien-free wizard school")
                .with_price(price(999))
                .with_categories([fantasy.id()]),
        )
        .await
        .unwrap();

    Seeded {
        tolkien,
        le_guin,
        fantasy,
        hobbit,
        silmarillion,
        earthsea,
    }
}
