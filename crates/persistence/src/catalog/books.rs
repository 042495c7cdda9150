use rust_decimal::Decimal;
use serde_json::Value;

use crate::core::AtomicWrites;
use crate::error::{StorageError, StorageResult, ValidationError};
use crate::model::{Author, Book, Category, Entity};
use crate::paginator::paginate_and_search;
use crate::query::EntityQuery;
use crate::types::{Paginated, ParamSource, StoredEntity};

use super::{BookDetails, BookWithAuthor, BooksAndAuthors, Catalog, merge_patch};

impl<S> Catalog<S>
where
    S: AtomicWrites + ?Sized,
{
    /// Creates a book.
    ///
    /// # Errors
    ///
    /// * `ValidationError::MissingRequiredField` if the title is blank
    /// * `ValidationError::InvalidReference` if the author is missing or
    ///   inactive, or a category does not exist
    pub async fn create_book(&self, book: Book) -> StorageResult<StoredEntity<Book>> {
        book.validate()?;
        self.check_book_references(&book).await?;
        self.insert(&book).await
    }

    /// Returns the book with its author and categories.
    pub async fn get_book(&self, id: u64) -> StorageResult<BookDetails> {
        let book = self.load::<Book>(id).await?;
        let author = self.storage.read(Author::KIND, book.data().author_id).await?;
        let author = author.map(|record| record.into_typed::<Author>()).transpose()?;

        let mut categories: Vec<_> = self
            .load_many::<Category>(book.data().category_ids.iter().copied())
            .await?
            .into_values()
            .collect();
        categories.sort_by_key(|c| c.id());

        Ok(BookDetails {
            book,
            author,
            categories,
        })
    }

    pub async fn update_book(&self, id: u64, book: Book) -> StorageResult<StoredEntity<Book>> {
        let current = self.load::<Book>(id).await?;
        book.validate()?;
        self.check_book_references(&book).await?;
        self.replace(&current, &book).await
    }

    /// Applies a JSON merge patch to a book. The patched book is checked
    /// the same way as on create.
    pub async fn patch_book(&self, id: u64, patch: &Value) -> StorageResult<StoredEntity<Book>> {
        let current = self.load::<Book>(id).await?;
        let patched = merge_patch(&current, patch)?;
        patched.validate()?;
        self.check_book_references(&patched).await?;
        self.replace(&current, &patched).await
    }

    pub async fn delete_book(&self, id: u64) -> StorageResult<()> {
        self.storage.delete(Book::KIND, id).await?;
        tracing::info!(id, "Deleted book");
        Ok(())
    }

    /// Lists books, each with its author.
    pub async fn list_books<P>(&self, params: &P) -> StorageResult<Paginated<BookWithAuthor>>
    where
        P: ParamSource + ?Sized,
    {
        let page =
            paginate_and_search::<Book, _, _>(&*self.storage, params, EntityQuery::new(Book::KIND), None)
                .await?;

        let authors = self
            .load_many::<Author>(page.items.iter().map(|b| b.data().author_id))
            .await?;

        Ok(page.map(|book| {
            let author = authors.get(&book.data().author_id).cloned();
            BookWithAuthor { book, author }
        }))
    }

    /// Loads every active book and author with both reads in flight at once.
    pub async fn books_and_authors_concurrently(&self) -> StorageResult<BooksAndAuthors> {
        let books_query = EntityQuery::new(Book::KIND);
        let authors_query = EntityQuery::new(Author::KIND);

        let (books, authors) = tokio::try_join!(
            self.storage.fetch_all(&books_query),
            self.storage.fetch_all(&authors_query),
        )?;

        Ok(BooksAndAuthors {
            books: books.into_iter().map(|r| r.into_typed::<Book>()).collect::<StorageResult<_>>()?,
            authors: authors.into_iter().map(|r| r.into_typed::<Author>()).collect::<StorageResult<_>>()?,
        })
    }

    /// Loads every active book, then every active author.
    pub async fn books_and_authors_sequentially(&self) -> StorageResult<BooksAndAuthors> {
        let books = self.storage.fetch_all(&EntityQuery::new(Book::KIND)).await?;
        let authors = self.storage.fetch_all(&EntityQuery::new(Author::KIND)).await?;

        Ok(BooksAndAuthors {
            books: books.into_iter().map(|r| r.into_typed::<Book>()).collect::<StorageResult<_>>()?,
            authors: authors.into_iter().map(|r| r.into_typed::<Author>()).collect::<StorageResult<_>>()?,
        })
    }

    /// Inserts `count` generated books for `author_id`, for load testing.
    ///
    /// A row that fails to insert is logged and skipped. Returns the number
    /// of books written.
    pub async fn import_books(&self, author_id: u64, count: u32) -> StorageResult<u32> {
        self.check_author(author_id).await?;

        let mut inserted = 0;
        for n in 1..=count {
            let book = Book::new(format!("Imported Book {}", n), author_id)
                .with_description(format!("Generated book {} of {}", n, count))
                .with_price(Decimal::new(1999, 2));

            match self.insert(&book).await {
                Ok(_) => inserted += 1,
                Err(e) => tracing::warn!(author_id, n, error = %e, "Skipping imported book"),
            }
        }

        tracing::info!(author_id, requested = count, inserted, "Imported books");
        Ok(inserted)
    }

    async fn check_author(&self, author_id: u64) -> StorageResult<()> {
        let author = self.storage.read(Author::KIND, author_id).await?;
        let active = match author {
            Some(record) => record.into_typed::<Author>()?.data().active,
            None => false,
        };
        if !active {
            return Err(ValidationError::InvalidReference {
                field: "author_id".to_string(),
                message: format!("author {} does not exist or is inactive", author_id),
            }
            .into());
        }
        Ok(())
    }

    async fn check_book_references(&self, book: &Book) -> StorageResult<()> {
        self.check_author(book.author_id).await?;

        let found = self
            .load_many::<Category>(book.category_ids.iter().copied())
            .await?;
        if let Some(missing) = book.category_ids.iter().find(|id| !found.contains_key(*id)) {
            return Err(StorageError::Validation(ValidationError::InvalidReference {
                field: "category_ids".to_string(),
                message: format!("category {} does not exist", missing),
            }));
        }
        Ok(())
    }
}
