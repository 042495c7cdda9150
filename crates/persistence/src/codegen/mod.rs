//! Human-readable entity codes.
//!
//! A code is a fixed per-kind prefix followed by the number of rows of that
//! kind ever created plus one, zero-padded to at least two digits:
//! `AU01`, `AU02`, ..., `AU99`, `AU100`. Soft-deleted rows keep counting, so
//! a code is not reused after a delete.
//!
//! [`CodeGenerator::generate`] counts and formats without writing anything.
//! Two callers that count before either inserts receive the same code; use
//! [`AtomicWrites::create_coded`](crate::core::AtomicWrites::create_coded)
//! when the code is about to be stored.

mod generator;
mod registry;

pub use generator::CodeGenerator;
pub use registry::PrefixRegistry;

/// Formats `<prefix><count + 1>` with the number zero-padded to two digits.
///
/// ```
/// use bookstore_persistence::codegen::format_code;
///
/// assert_eq!(format_code("AU", 0), "AU01");
/// assert_eq!(format_code("TST", 41), "TST42");
/// assert_eq!(format_code("AU", 99), "AU100");
/// ```
pub fn format_code(prefix: &str, count: u64) -> String {
    format!("{prefix}{:02}", count.saturating_add(1))
}
