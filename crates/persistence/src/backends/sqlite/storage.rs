//! EntityStorage and AtomicWrites implementations for SQLite.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior, params_from_iter};
use serde_json::Value;

use crate::codegen::format_code;
use crate::core::{AtomicWrites, CodeAssignment, EntityStorage, WriteOp, WriteOutcome};
use crate::error::{
    BackendError, ConcurrencyError, ResourceError, StorageError, StorageResult,
};
use crate::query::EntityQuery;
use crate::types::{EntityKind, EntityRecord, PageWindow, RowScope};

use super::SqliteBackend;
use super::query_builder::SqlParam;

const SELECT_COLUMNS: &str = "id, code, version, data, created_at, updated_at, deleted_at";

fn internal_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "sqlite".to_string(),
        message,
        source: None,
    })
}

fn serialization_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::SerializationError { message })
}

fn now_text() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| serialization_error(format!("Failed to parse timestamp '{}': {}", value, e)))
}

fn to_sql_int(name: &str, value: u64) -> StorageResult<i64> {
    i64::try_from(value).map_err(|_| {
        StorageError::invalid_parameter(name, value.to_string(), "value is out of range")
    })
}

fn from_sql_int(name: &str, value: i64) -> StorageResult<u64> {
    u64::try_from(value).map_err(|_| internal_error(format!("negative {} in storage: {}", name, value)))
}

fn ensure_object(data: &Value) -> StorageResult<()> {
    if data.is_object() {
        Ok(())
    } else {
        Err(StorageError::invalid_parameter(
            "data",
            data.to_string(),
            "entity payload must be a JSON object",
        ))
    }
}

/// Columns of one `entities` row, before conversion.
struct RawRow {
    id: i64,
    code: Option<String>,
    version: i64,
    data: String,
    created_at: String,
    updated_at: String,
    deleted_at: Option<String>,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            code: row.get(1)?,
            version: row.get(2)?,
            data: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
            deleted_at: row.get(6)?,
        })
    }

    fn into_record(self, kind: EntityKind) -> StorageResult<EntityRecord> {
        let data: Value = serde_json::from_str(&self.data)
            .map_err(|e| serialization_error(format!("Failed to parse {} payload: {}", kind, e)))?;
        let deleted_at = self.deleted_at.as_deref().map(parse_timestamp).transpose()?;

        Ok(EntityRecord::from_storage(
            kind,
            from_sql_int("id", self.id)?,
            self.code,
            from_sql_int("version", self.version)?,
            data,
            parse_timestamp(&self.created_at)?,
            parse_timestamp(&self.updated_at)?,
            deleted_at,
        ))
    }
}

/// Next id for `kind`. Ids of deleted rows are never reused.
fn next_id(conn: &Connection, kind: EntityKind) -> StorageResult<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(id), 0) + 1 FROM entities WHERE kind = ?1",
        [kind.as_str()],
        |row| row.get(0),
    )
    .map_err(|e| internal_error(format!("Failed to allocate id: {}", e)))
}

/// Number of `kind` rows ever created, deleted ones included.
fn count_all(conn: &Connection, kind: EntityKind) -> StorageResult<u64> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM entities WHERE kind = ?1",
            [kind.as_str()],
            |row| row.get(0),
        )
        .map_err(|e| internal_error(format!("Failed to count {} rows: {}", kind, e)))?;
    from_sql_int("count", count)
}

fn select_row(
    conn: &Connection,
    kind: EntityKind,
    id: u64,
    scope: RowScope,
) -> StorageResult<Option<EntityRecord>> {
    let sql = match scope {
        RowScope::ActiveOnly => format!(
            "SELECT {} FROM entities WHERE kind = ?1 AND id = ?2 AND is_deleted = 0",
            SELECT_COLUMNS
        ),
        RowScope::IncludeDeleted => format!(
            "SELECT {} FROM entities WHERE kind = ?1 AND id = ?2",
            SELECT_COLUMNS
        ),
    };

    let raw = conn
        .query_row(
            &sql,
            rusqlite::params![kind.as_str(), to_sql_int("id", id)?],
            RawRow::from_row,
        )
        .optional()
        .map_err(|e| internal_error(format!("Failed to read {}: {}", kind, e)))?;

    raw.map(|raw| raw.into_record(kind)).transpose()
}

fn require_row(
    conn: &Connection,
    kind: EntityKind,
    id: u64,
    scope: RowScope,
) -> StorageResult<EntityRecord> {
    select_row(conn, kind, id, scope)?.ok_or_else(|| StorageError::not_found(kind, id))
}

fn insert_row(
    conn: &Connection,
    kind: EntityKind,
    code: Option<String>,
    data: &Value,
) -> StorageResult<EntityRecord> {
    ensure_object(data)?;
    let id = next_id(conn, kind)?;
    let now = now_text();
    let data_text = serde_json::to_string(data)?;

    conn.execute(
        "INSERT INTO entities (kind, id, code, version, data, created_at, updated_at, is_deleted)
         VALUES (?1, ?2, ?3, 1, ?4, ?5, ?5, 0)",
        rusqlite::params![kind.as_str(), id, code, data_text, now],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(ref err, _) if err.code == ErrorCode::ConstraintViolation => {
            StorageError::Resource(ResourceError::AlreadyExists {
                kind,
                message: format!("code {} is already taken", code.as_deref().unwrap_or("")),
            })
        }
        other => internal_error(format!("Failed to insert {}: {}", kind, other)),
    })?;

    let id = from_sql_int("id", id)?;
    tracing::debug!(kind = %kind, id, code = code.as_deref(), "Created entity");
    require_row(conn, kind, id, RowScope::IncludeDeleted)
}

/// Checks that an active row exists at `expected_version`.
fn check_version(
    conn: &Connection,
    kind: EntityKind,
    id: u64,
    expected_version: Option<u64>,
) -> StorageResult<()> {
    let current = require_row(conn, kind, id, RowScope::ActiveOnly)?;
    match expected_version {
        Some(expected) if expected != current.version() => {
            Err(StorageError::Concurrency(ConcurrencyError::VersionConflict {
                kind,
                id,
                expected_version: expected,
                actual_version: current.version(),
            }))
        }
        _ => Ok(()),
    }
}

fn update_row(
    conn: &Connection,
    kind: EntityKind,
    id: u64,
    expected_version: u64,
    data: &Value,
) -> StorageResult<EntityRecord> {
    ensure_object(data)?;
    check_version(conn, kind, id, Some(expected_version))?;

    conn.execute(
        "UPDATE entities SET data = ?1, version = version + 1, updated_at = ?2
         WHERE kind = ?3 AND id = ?4",
        rusqlite::params![
            serde_json::to_string(data)?,
            now_text(),
            kind.as_str(),
            to_sql_int("id", id)?
        ],
    )
    .map_err(|e| internal_error(format!("Failed to update {}: {}", kind, e)))?;

    tracing::debug!(kind = %kind, id, "Updated entity");
    require_row(conn, kind, id, RowScope::ActiveOnly)
}

fn soft_delete_row(
    conn: &Connection,
    kind: EntityKind,
    id: u64,
    expected_version: Option<u64>,
) -> StorageResult<()> {
    check_version(conn, kind, id, expected_version)?;

    let now = now_text();
    conn.execute(
        "UPDATE entities SET is_deleted = 1, deleted_at = ?1, updated_at = ?1, version = version + 1
         WHERE kind = ?2 AND id = ?3",
        rusqlite::params![now, kind.as_str(), to_sql_int("id", id)?],
    )
    .map_err(|e| internal_error(format!("Failed to delete {}: {}", kind, e)))?;

    tracing::debug!(kind = %kind, id, "Soft-deleted entity");
    Ok(())
}

fn restore_row(conn: &Connection, kind: EntityKind, id: u64) -> StorageResult<EntityRecord> {
    let changed = conn
        .execute(
            "UPDATE entities SET is_deleted = 0, deleted_at = NULL, updated_at = ?1, version = version + 1
             WHERE kind = ?2 AND id = ?3 AND is_deleted = 1",
            rusqlite::params![now_text(), kind.as_str(), to_sql_int("id", id)?],
        )
        .map_err(|e| internal_error(format!("Failed to restore {}: {}", kind, e)))?;

    if changed == 0 {
        return Err(StorageError::not_found(kind, id));
    }

    tracing::debug!(kind = %kind, id, "Restored entity");
    require_row(conn, kind, id, RowScope::ActiveOnly)
}

fn apply_op(
    conn: &Connection,
    index: usize,
    op: WriteOp,
    outcomes: &[WriteOutcome],
) -> StorageResult<WriteOutcome> {
    match op {
        WriteOp::Create { kind, code, data } => {
            let code = match code {
                CodeAssignment::None => None,
                CodeAssignment::Explicit(code) => Some(code),
                CodeAssignment::Sequential { prefix } => {
                    Some(format_code(&prefix, count_all(conn, kind)?))
                }
            };
            insert_row(conn, kind, code, &data).map(WriteOutcome::Created)
        }
        WriteOp::Update {
            kind,
            id,
            expected_version,
            mut data,
            link,
        } => {
            if let Some(link) = link {
                let linked_id = match outcomes.get(link.op_index) {
                    Some(WriteOutcome::Created(record)) if link.op_index < index => record.id(),
                    _ => {
                        return Err(StorageError::invalid_parameter(
                            "link",
                            link.op_index.to_string(),
                            "must refer to an earlier create in the same batch",
                        ));
                    }
                };
                if let Some(fields) = data.as_object_mut() {
                    fields.insert(link.field, Value::from(linked_id));
                }
            }
            update_row(conn, kind, id, expected_version, &data).map(WriteOutcome::Updated)
        }
        WriteOp::Delete {
            kind,
            id,
            expected_version,
        } => {
            soft_delete_row(conn, kind, id, Some(expected_version))?;
            Ok(WriteOutcome::Deleted { kind, id })
        }
    }
}

impl SqliteBackend {
    /// Runs `f` inside an IMMEDIATE transaction. The write lock is taken at
    /// BEGIN, so reads inside `f` see no concurrent writer. Dropping the
    /// transaction on error rolls it back.
    fn with_write_transaction<T>(
        &self,
        f: impl FnOnce(&Connection) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let result = f(&tx)?;

        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit transaction: {}", e)))?;
        Ok(result)
    }
}

#[async_trait]
impl EntityStorage for SqliteBackend {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn create(
        &self,
        kind: EntityKind,
        code: Option<String>,
        data: Value,
    ) -> StorageResult<EntityRecord> {
        self.with_write_transaction(|conn| insert_row(conn, kind, code, &data))
    }

    async fn read(&self, kind: EntityKind, id: u64) -> StorageResult<Option<EntityRecord>> {
        let conn = self.get_connection()?;
        select_row(&conn, kind, id, RowScope::ActiveOnly)
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: u64,
        expected_version: u64,
        data: Value,
    ) -> StorageResult<EntityRecord> {
        self.with_write_transaction(|conn| update_row(conn, kind, id, expected_version, &data))
    }

    async fn delete(&self, kind: EntityKind, id: u64) -> StorageResult<()> {
        self.with_write_transaction(|conn| soft_delete_row(conn, kind, id, None))
    }

    async fn restore(&self, kind: EntityKind, id: u64) -> StorageResult<EntityRecord> {
        self.with_write_transaction(|conn| restore_row(conn, kind, id))
    }

    async fn count(&self, query: &EntityQuery) -> StorageResult<u64> {
        let conn = self.get_connection()?;
        let clause = self.query_builder().where_clause(query)?;
        let sql = format!("SELECT COUNT(*) FROM entities WHERE {}", clause.sql);

        let count: i64 = conn
            .query_row(&sql, params_from_iter(clause.params.iter()), |row| row.get(0))
            .map_err(|e| internal_error(format!("Failed to count {} rows: {}", query.kind(), e)))?;

        from_sql_int("count", count)
    }

    async fn fetch(
        &self,
        query: &EntityQuery,
        window: PageWindow,
    ) -> StorageResult<Vec<EntityRecord>> {
        let conn = self.get_connection()?;
        let mut clause = self.query_builder().where_clause(query)?;

        // SQLite reads a negative LIMIT as "no limit". No table holds more
        // than i64::MAX rows, so a larger offset is simply past the end.
        let limit = window
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(-1);
        let offset = i64::try_from(window.offset).unwrap_or(i64::MAX);
        clause.params.push(SqlParam::integer(limit));
        clause.params.push(SqlParam::integer(offset));

        let sql = format!(
            "SELECT {} FROM entities WHERE {} ORDER BY id ASC LIMIT ? OFFSET ?",
            SELECT_COLUMNS, clause.sql
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| internal_error(format!("Failed to prepare query: {}", e)))?;
        let rows = stmt
            .query_map(params_from_iter(clause.params.iter()), RawRow::from_row)
            .map_err(|e| internal_error(format!("Failed to fetch {} rows: {}", query.kind(), e)))?;

        let mut records = Vec::new();
        for row in rows {
            let raw = row.map_err(|e| internal_error(format!("Failed to read row: {}", e)))?;
            records.push(raw.into_record(query.kind())?);
        }
        Ok(records)
    }
}

#[async_trait]
impl AtomicWrites for SqliteBackend {
    async fn apply_batch(&self, ops: Vec<WriteOp>) -> StorageResult<Vec<WriteOutcome>> {
        let op_count = ops.len();
        let outcomes = self.with_write_transaction(|conn| {
            let mut outcomes = Vec::with_capacity(op_count);
            for (index, op) in ops.into_iter().enumerate() {
                let outcome = apply_op(conn, index, op, &outcomes)?;
                outcomes.push(outcome);
            }
            Ok(outcomes)
        })?;

        tracing::debug!(ops = op_count, "Applied write batch");
        Ok(outcomes)
    }
}
