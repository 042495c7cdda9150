use serde_json::Value;

use crate::core::AtomicWrites;
use crate::error::StorageResult;
use crate::model::{Category, Entity};
use crate::paginator::paginate_and_search;
use crate::query::EntityQuery;
use crate::types::{Paginated, ParamSource, StoredEntity};

use super::{Catalog, merge_patch};

impl<S> Catalog<S>
where
    S: AtomicWrites + ?Sized,
{
    pub async fn create_category(&self, category: Category) -> StorageResult<StoredEntity<Category>> {
        self.insert(&category).await
    }

    pub async fn get_category(&self, id: u64) -> StorageResult<StoredEntity<Category>> {
        self.load(id).await
    }

    pub async fn update_category(
        &self,
        id: u64,
        category: Category,
    ) -> StorageResult<StoredEntity<Category>> {
        let current = self.load::<Category>(id).await?;
        self.replace(&current, &category).await
    }

    pub async fn patch_category(
        &self,
        id: u64,
        patch: &Value,
    ) -> StorageResult<StoredEntity<Category>> {
        let current = self.load::<Category>(id).await?;
        let patched = merge_patch(&current, patch)?;
        self.replace(&current, &patched).await
    }

    /// Soft-deletes a category. Books keep the id in `category_ids`; it is
    /// dropped from their details once the category is gone.
    pub async fn delete_category(&self, id: u64) -> StorageResult<()> {
        self.storage.delete(Category::KIND, id).await?;
        tracing::info!(id, "Deleted category");
        Ok(())
    }

    pub async fn list_categories<P>(
        &self,
        params: &P,
    ) -> StorageResult<Paginated<StoredEntity<Category>>>
    where
        P: ParamSource + ?Sized,
    {
        paginate_and_search(&*self.storage, params, EntityQuery::new(Category::KIND), None).await
    }
}
