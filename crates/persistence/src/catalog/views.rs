//! Read models that join an entity with the rows it references.

use serde::Serialize;

use crate::model::{Author, Book, Category, FavoriteBook};
use crate::types::StoredEntity;

/// An author with its active books.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorWithBooks {
    #[serde(flatten)]
    pub author: StoredEntity<Author>,
    pub books: Vec<StoredEntity<Book>>,
}

/// A book with its author and categories.
#[derive(Debug, Clone, Serialize)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: StoredEntity<Book>,
    /// `None` if the author has since been deleted.
    pub author: Option<StoredEntity<Author>>,
    pub categories: Vec<StoredEntity<Category>>,
}

/// A book with its author, as listed.
#[derive(Debug, Clone, Serialize)]
pub struct BookWithAuthor {
    #[serde(flatten)]
    pub book: StoredEntity<Book>,
    pub author: Option<StoredEntity<Author>>,
}

/// A favorite with the book it points at.
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteWithBook {
    #[serde(flatten)]
    pub favorite: StoredEntity<FavoriteBook>,
    pub book: Option<StoredEntity<Book>>,
}

/// Every active book and every active author.
#[derive(Debug, Clone, Serialize)]
pub struct BooksAndAuthors {
    pub books: Vec<StoredEntity<Book>>,
    pub authors: Vec<StoredEntity<Author>>,
}
