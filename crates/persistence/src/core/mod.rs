//! Core storage traits and abstractions.
//!
//! - [`Backend`] - Database driver lifecycle and capability discovery
//! - [`EntityStorage`] - Create/read/update/delete, count and fetch
//! - [`AtomicWrites`] - All-or-nothing write batches and atomic code allocation
//!
//! ```text
//! EntityStorage
//!     └── AtomicWrites
//! ```

mod backend;
mod storage;
mod transaction;

pub use backend::{Backend, BackendCapability, BackendKind};
pub use storage::EntityStorage;
pub use transaction::{AtomicWrites, CodeAssignment, LinkTo, WriteOp, WriteOutcome};
