//! Offset pagination with optional multi-field substring search.
//!
//! [`paginate_and_search`] reads `page`, `limit`, `search`, `search_fields`
//! and `search_operator` from a [`ParamSource`], narrows the query, counts
//! the matches and fetches one page:
//!
//! 1. `page` and `limit` must be positive integers (defaults 1 and 10).
//! 2. A preset query, when given, replaces the base query entirely.
//! 3. If both `search` and `search_fields` are non-empty, one
//!    case-insensitive "contains" condition per field is joined with
//!    `search_operator` (`AND`, or `OR` for anything else) and ANDed onto the
//!    query. A search term without fields is ignored. Only the kind's
//!    searchable fields may be named; any other field is rejected rather
//!    than matched.
//! 4. The count runs before the fetch, as two separate statements, so
//!    `total_items` is a snapshot that concurrent writers can make stale.
//!
//! A page past the end yields no items and no error; the totals still
//! reflect every match. A storage failure during the count or fetch is
//! reported as `BackendError::Unavailable`. On any error nothing is returned.

use crate::core::EntityStorage;
use crate::error::{BackendError, StorageError, StorageResult, ValidationError};
use crate::model::Entity;
use crate::query::{EntityQuery, Filter};
use crate::types::{
    EntityKind, EntityRecord, PageRequest, Paginated, ParamSource, SearchSpec, StoredEntity,
    param_names,
};

/// Paginates and searches rows of `T`, returning typed entities.
///
/// The effective query (preset if given, else base) must target `T::KIND`.
/// Search fields outside [`EntityKind::searchable_fields`] are rejected,
/// never matched.
///
/// # Errors
///
/// * `ValidationError::InvalidParameter` for a malformed `page`/`limit` or
///   a search field that is not searchable for the kind
/// * `ValidationError::KindMismatch` if the query targets another kind
/// * `BackendError::Unavailable` if the count or fetch fails
pub async fn paginate_and_search<T, S, P>(
    storage: &S,
    params: &P,
    base: EntityQuery,
    preset: Option<EntityQuery>,
) -> StorageResult<Paginated<StoredEntity<T>>>
where
    T: Entity,
    S: EntityStorage + ?Sized,
    P: ParamSource + ?Sized,
{
    let actual = preset.as_ref().unwrap_or(&base).kind();
    if actual != T::KIND {
        return Err(ValidationError::KindMismatch {
            expected: T::KIND,
            actual,
        }
        .into());
    }

    paginate_records(storage, params, base, preset)
        .await?
        .try_map(EntityRecord::into_typed)
}

/// Untyped variant of [`paginate_and_search`].
pub async fn paginate_records<S, P>(
    storage: &S,
    params: &P,
    base: EntityQuery,
    preset: Option<EntityQuery>,
) -> StorageResult<Paginated<EntityRecord>>
where
    S: EntityStorage + ?Sized,
    P: ParamSource + ?Sized,
{
    let request = PageRequest::from_params(params)?;
    paginate_request(storage, &request, base, preset).await
}

/// Runs an already parsed [`PageRequest`].
pub async fn paginate_request<S>(
    storage: &S,
    request: &PageRequest,
    base: EntityQuery,
    preset: Option<EntityQuery>,
) -> StorageResult<Paginated<EntityRecord>>
where
    S: EntityStorage + ?Sized,
{
    let window = request.window()?;

    let mut query = preset.unwrap_or(base);
    if let Some(search) = request.search() {
        check_search_fields(&query, search)?;
        query = query.filter(Filter::from_search(search));
    }

    let kind = query.kind();
    let total_items = storage
        .count(&query)
        .await
        .map_err(|e| unavailable(storage, "count", kind, e))?;
    let items = storage
        .fetch(&query, window)
        .await
        .map_err(|e| unavailable(storage, "fetch", kind, e))?;

    Ok(Paginated {
        current_page: request.page(),
        total_pages: request.total_pages(total_items),
        total_items,
        items_per_page: request.limit(),
        items,
    })
}

/// Reports a storage failure as `Unavailable`. Errors in the query itself
/// pass through.
fn unavailable<S>(storage: &S, step: &str, kind: EntityKind, err: StorageError) -> StorageError
where
    S: EntityStorage + ?Sized,
{
    if !err.is_storage_failure() {
        return err;
    }
    BackendError::Unavailable {
        backend_name: storage.backend_name().to_string(),
        message: format!("failed to {} {} rows: {}", step, kind, err),
    }
    .into()
}

fn check_search_fields(query: &EntityQuery, search: &SearchSpec) -> StorageResult<()> {
    let kind = query.kind();
    match search.fields().iter().find(|f| !kind.is_searchable(f.as_str())) {
        Some(field) => Err(StorageError::invalid_parameter(
            param_names::SEARCH_FIELDS,
            field.as_str(),
            format!(
                "not a searchable field of {}; expected one of: {}",
                kind,
                kind.searchable_fields().join(", ")
            ),
        )),
        None => Ok(()),
    }
}
