//! Core types for the persistence layer.
//!
//! - [`EntityKind`] - The closed set of stored entity kinds
//! - [`RowState`], [`RowScope`] - Soft-delete state and query visibility
//! - [`StoredEntity`], [`EntityRecord`] - Payloads with persistence metadata
//! - [`PageRequest`], [`Paginated`] - Offset pagination with optional search
//! - [`ParamSource`], [`QueryParams`] - Request parameter lookup

mod entity_kind;
mod pagination;
mod params;
mod row_state;
mod stored_entity;

pub use entity_kind::EntityKind;
pub use pagination::{
    DEFAULT_LIMIT, DEFAULT_PAGE, PageRequest, PageWindow, Paginated, SearchOperator, SearchSpec,
    param_names,
};
pub use params::{ParamSource, QueryParams};
pub use row_state::{RowScope, RowState};
pub use stored_entity::{EntityRecord, StoredEntity};
