//! Assertion helpers for storage results.

use bookstore_persistence::error::{
    BackendError, ConcurrencyError, ResourceError, StorageError, ValidationError,
};
use bookstore_persistence::types::{Paginated, StoredEntity};

/// Asserts that a result is a ResourceError::NotFound.
pub fn assert_not_found<T>(result: Result<T, StorageError>) {
    match result {
        Ok(_) => panic!("Expected NotFound error, but got Ok"),
        Err(StorageError::Resource(ResourceError::NotFound { .. })) => {}
        Err(e) => panic!("Expected NotFound error, got {:?}", e),
    }
}

/// Asserts that a result is a ResourceError::AlreadyExists.
pub fn assert_already_exists<T>(result: Result<T, StorageError>) {
    match result {
        Ok(_) => panic!("Expected AlreadyExists error, but got Ok"),
        Err(StorageError::Resource(ResourceError::AlreadyExists { .. })) => {}
        Err(e) => panic!("Expected AlreadyExists error, got {:?}", e),
    }
}

/// Asserts that a result is a ConcurrencyError::VersionConflict.
pub fn assert_version_conflict<T>(result: Result<T, StorageError>) {
    match result {
        Ok(_) => panic!("Expected VersionConflict error, but got Ok"),
        Err(StorageError::Concurrency(ConcurrencyError::VersionConflict { .. })) => {}
        Err(e) => panic!("Expected VersionConflict error, got {:?}", e),
    }
}

/// Asserts that a result is a ValidationError::InvalidParameter for `name`.
pub fn assert_invalid_parameter<T>(result: Result<T, StorageError>, name: &str) {
    match result {
        Ok(_) => panic!("Expected InvalidParameter '{}', but got Ok", name),
        Err(StorageError::Validation(ValidationError::InvalidParameter { name: actual, .. })) => {
            assert_eq!(actual, name, "InvalidParameter names the wrong parameter");
        }
        Err(e) => panic!("Expected InvalidParameter '{}', got {:?}", name, e),
    }
}

/// Asserts that a result is a ValidationError::InvalidReference for `field`.
pub fn assert_invalid_reference<T>(result: Result<T, StorageError>, field: &str) {
    match result {
        Ok(_) => panic!("Expected InvalidReference '{}', but got Ok", field),
        Err(StorageError::Validation(ValidationError::InvalidReference { field: actual, .. })) => {
            assert_eq!(actual, field, "InvalidReference names the wrong field");
        }
        Err(e) => panic!("Expected InvalidReference '{}', got {:?}", field, e),
    }
}

/// Asserts that a result is a ValidationError::InvalidState.
pub fn assert_invalid_state<T>(result: Result<T, StorageError>) {
    match result {
        Ok(_) => panic!("Expected InvalidState error, but got Ok"),
        Err(StorageError::Validation(ValidationError::InvalidState { .. })) => {}
        Err(e) => panic!("Expected InvalidState error, got {:?}", e),
    }
}

/// Asserts that a result is a BackendError::Unavailable.
pub fn assert_unavailable<T>(result: Result<T, StorageError>) {
    match result {
        Ok(_) => panic!("Expected Unavailable error, but got Ok"),
        Err(StorageError::Backend(BackendError::Unavailable { .. })) => {}
        Err(e) => panic!("Expected Unavailable error, got {:?}", e),
    }
}

/// Asserts the totals of a page.
pub fn assert_page<T>(page: &Paginated<T>, current_page: u64, total_pages: u64, total_items: u64) {
    assert_eq!(page.current_page, current_page, "current_page mismatch");
    assert_eq!(page.total_pages, total_pages, "total_pages mismatch");
    assert_eq!(page.total_items, total_items, "total_items mismatch");
}

/// Ids of the entities on a page, in page order.
pub fn page_ids<T>(page: &Paginated<StoredEntity<T>>) -> Vec<u64> {
    page.items.iter().map(|e| e.id()).collect()
}
