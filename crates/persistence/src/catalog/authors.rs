use serde_json::Value;

use crate::core::AtomicWrites;
use crate::error::StorageResult;
use crate::model::{Author, Book, Entity};
use crate::paginator::paginate_and_search;
use crate::query::{EntityQuery, Filter};
use crate::types::{Paginated, ParamSource, StoredEntity};

use super::{AuthorWithBooks, Catalog, merge_patch};

impl<S> Catalog<S>
where
    S: AtomicWrites + ?Sized,
{
    pub async fn create_author(&self, author: Author) -> StorageResult<StoredEntity<Author>> {
        self.insert(&author).await
    }

    /// Returns the author with its active books.
    pub async fn get_author(&self, id: u64) -> StorageResult<AuthorWithBooks> {
        let author = self.load::<Author>(id).await?;

        let query = EntityQuery::new(Book::KIND)
            .filter(Filter::eq("author_id", id))
            .filter(Filter::eq("active", true));
        let books = self
            .storage
            .fetch_all(&query)
            .await?
            .into_iter()
            .map(|record| record.into_typed::<Book>())
            .collect::<StorageResult<Vec<_>>>()?;

        Ok(AuthorWithBooks { author, books })
    }

    pub async fn update_author(&self, id: u64, author: Author) -> StorageResult<StoredEntity<Author>> {
        let current = self.load::<Author>(id).await?;
        self.replace(&current, &author).await
    }

    /// Applies a JSON merge patch to an author.
    pub async fn patch_author(&self, id: u64, patch: &Value) -> StorageResult<StoredEntity<Author>> {
        let current = self.load::<Author>(id).await?;
        let patched = merge_patch(&current, patch)?;
        self.replace(&current, &patched).await
    }

    pub async fn delete_author(&self, id: u64) -> StorageResult<()> {
        self.storage.delete(Author::KIND, id).await?;
        tracing::info!(id, "Deleted author");
        Ok(())
    }

    pub async fn list_authors<P>(&self, params: &P) -> StorageResult<Paginated<StoredEntity<Author>>>
    where
        P: ParamSource + ?Sized,
    {
        paginate_and_search(&*self.storage, params, EntityQuery::new(Author::KIND), None).await
    }
}
