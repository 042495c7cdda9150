//! Atomic write batches.
//!
//! A batch is an ordered list of [`WriteOp`]s applied all-or-nothing. It is
//! the storage-level answer to read-modify-write sequences that must not
//! interleave with other writers: buying a book (insert a purchase, adjust
//! stock), checking out purchases, and allocating sequential codes.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageResult;
use crate::types::{EntityKind, EntityRecord};

use super::storage::EntityStorage;

/// How a created row gets its code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CodeAssignment {
    /// The row has no code.
    #[default]
    None,
    /// The caller supplies the code.
    Explicit(String),
    /// The backend counts existing rows of the kind (deleted ones included)
    /// and formats `<prefix><count + 1>` inside the batch.
    Sequential { prefix: String },
}

/// Copies the id of a row created earlier in the same batch into a payload
/// field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTo {
    /// Top-level payload field to set.
    pub field: String,
    /// Index of the `Create` op whose id is copied.
    pub op_index: usize,
}

/// One write in a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Create {
        kind: EntityKind,
        code: CodeAssignment,
        data: Value,
    },
    Update {
        kind: EntityKind,
        id: u64,
        expected_version: u64,
        data: Value,
        link: Option<LinkTo>,
    },
    Delete {
        kind: EntityKind,
        id: u64,
        expected_version: u64,
    },
}

impl WriteOp {
    pub fn create(kind: EntityKind, code: CodeAssignment, data: Value) -> Self {
        WriteOp::Create { kind, code, data }
    }

    pub fn update(kind: EntityKind, id: u64, expected_version: u64, data: Value) -> Self {
        WriteOp::Update {
            kind,
            id,
            expected_version,
            data,
            link: None,
        }
    }

    pub fn delete(kind: EntityKind, id: u64, expected_version: u64) -> Self {
        WriteOp::Delete {
            kind,
            id,
            expected_version,
        }
    }

    /// Sets `field` of an update's payload to the id created by the op at
    /// `op_index`. Has no effect on other ops.
    pub fn linking(mut self, field: impl Into<String>, op_index: usize) -> Self {
        if let WriteOp::Update { link, .. } = &mut self {
            *link = Some(LinkTo {
                field: field.into(),
                op_index,
            });
        }
        self
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            WriteOp::Create { kind, .. }
            | WriteOp::Update { kind, .. }
            | WriteOp::Delete { kind, .. } => *kind,
        }
    }
}

/// The result of one op in an applied batch, in op order.
#[derive(Debug, Clone)]
pub enum WriteOutcome {
    Created(EntityRecord),
    Updated(EntityRecord),
    Deleted { kind: EntityKind, id: u64 },
}

impl WriteOutcome {
    /// The written row, for creates and updates.
    pub fn record(&self) -> Option<&EntityRecord> {
        match self {
            WriteOutcome::Created(record) | WriteOutcome::Updated(record) => Some(record),
            WriteOutcome::Deleted { .. } => None,
        }
    }

    pub fn into_record(self) -> Option<EntityRecord> {
        match self {
            WriteOutcome::Created(record) | WriteOutcome::Updated(record) => Some(record),
            WriteOutcome::Deleted { .. } => None,
        }
    }
}

/// Storage that can apply a batch of writes atomically.
#[async_trait]
pub trait AtomicWrites: EntityStorage {
    /// Applies every op or none of them.
    ///
    /// # Errors
    ///
    /// The first failing op aborts the batch and its error is returned;
    /// nothing from the batch is persisted.
    async fn apply_batch(&self, ops: Vec<WriteOp>) -> StorageResult<Vec<WriteOutcome>>;

    /// Inserts a row whose code is `<prefix><count + 1>`, counting and
    /// inserting as one atomic step so concurrent callers never share a
    /// code.
    async fn create_coded(
        &self,
        kind: EntityKind,
        prefix: &str,
        data: Value,
    ) -> StorageResult<EntityRecord> {
        let op = WriteOp::create(
            kind,
            CodeAssignment::Sequential {
                prefix: prefix.to_string(),
            },
            data,
        );
        let outcome = self.apply_batch(vec![op]).await?;
        outcome
            .into_iter()
            .next()
            .and_then(WriteOutcome::into_record)
            .ok_or_else(|| {
                crate::error::BackendError::Internal {
                    backend_name: self.backend_name().to_string(),
                    message: "batch returned no outcome for create".to_string(),
                    source: None,
                }
                .into()
            })
    }
}
