use crate::core::AtomicWrites;
use crate::error::{ResourceError, StorageResult};
use crate::model::{Book, Entity, FavoriteBook};
use crate::paginator::paginate_and_search;
use crate::query::{EntityQuery, Filter};
use crate::types::{Paginated, ParamSource, StoredEntity};

use super::{Catalog, FavoriteWithBook};

impl<S> Catalog<S>
where
    S: AtomicWrites + ?Sized,
{
    /// Marks a book as a favorite of a user.
    ///
    /// # Errors
    ///
    /// * `ResourceError::NotFound` if the book does not exist
    /// * `ResourceError::AlreadyExists` if it is already a favorite
    pub async fn add_favorite(
        &self,
        user_id: u64,
        book_id: u64,
    ) -> StorageResult<StoredEntity<FavoriteBook>> {
        self.active_user(user_id).await?;
        self.load::<Book>(book_id).await?;

        let existing = EntityQuery::new(FavoriteBook::KIND)
            .filter(Filter::eq("user_id", user_id))
            .filter(Filter::eq("book_id", book_id));
        if self.storage.count(&existing).await? > 0 {
            return Err(ResourceError::AlreadyExists {
                kind: FavoriteBook::KIND,
                message: format!("book {} is already a favorite of user {}", book_id, user_id),
            }
            .into());
        }

        self.insert(&FavoriteBook { user_id, book_id }).await
    }

    pub async fn remove_favorite(&self, user_id: u64, favorite_id: u64) -> StorageResult<()> {
        let favorite = self.load_owned::<FavoriteBook>(user_id, favorite_id).await?;
        self.storage.delete(FavoriteBook::KIND, favorite.id()).await
    }

    /// Lists a user's favorites, each with its book.
    pub async fn list_favorites<P>(
        &self,
        user_id: u64,
        params: &P,
    ) -> StorageResult<Paginated<FavoriteWithBook>>
    where
        P: ParamSource + ?Sized,
    {
        let preset = EntityQuery::new(FavoriteBook::KIND).filter(Filter::eq("user_id", user_id));
        let page = paginate_and_search::<FavoriteBook, _, _>(
            &*self.storage,
            params,
            EntityQuery::new(FavoriteBook::KIND),
            Some(preset),
        )
        .await?;

        let books = self
            .load_many::<Book>(page.items.iter().map(|f| f.data().book_id))
            .await?;

        Ok(page.map(|favorite| {
            let book = books.get(&favorite.data().book_id).cloned();
            FavoriteWithBook { favorite, book }
        }))
    }
}
