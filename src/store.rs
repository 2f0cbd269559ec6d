// 🗄️ Entity Store - generic persistence over the five record tables
//
// SQL is assembled from `Record::COLUMNS` and `RelationKey` only, never from
// caller-supplied strings.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::entities::{EntityKind, Record, RelationField, RelationKey};
use crate::error::{RecordsError, Result};
use crate::lifecycle::{self, Lifecycle, LifecycleState};

fn select_sql<R: Record>() -> String {
    format!(
        "SELECT id, {} FROM {}",
        R::COLUMNS.join(", "),
        R::KIND.table()
    )
}

fn query_records<R: Record>(conn: &Connection, sql: &str, args: Vec<Value>) -> Result<Vec<R>> {
    let mut stmt = conn.prepare(sql)?;
    let records = stmt
        .query_map(params_from_iter(args), |row| R::from_row(row))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

// ============================================================================
// READS
// ============================================================================

/// Non-archived records (the default listing)
pub fn list<R: Record>(conn: &Connection) -> Result<Vec<R>> {
    list_by_archived(conn, false)
}

/// Archived records only (the archive view)
pub fn list_archived<R: Record>(conn: &Connection) -> Result<Vec<R>> {
    list_by_archived(conn, true)
}

fn list_by_archived<R: Record>(conn: &Connection, archived: bool) -> Result<Vec<R>> {
    let sql = format!(
        "{} WHERE archived = ?1 ORDER BY name COLLATE NOCASE, id",
        select_sql::<R>()
    );
    query_records(conn, &sql, vec![Value::Integer(i64::from(archived))])
}

pub fn find<R: Record>(conn: &Connection, id: &str) -> Result<Option<R>> {
    let sql = format!("{} WHERE id = ?1", select_sql::<R>());
    let record = conn
        .query_row(&sql, [id], |row| R::from_row(row))
        .optional()?;
    Ok(record)
}

pub fn get<R: Record>(conn: &Connection, id: &str) -> Result<R> {
    find(conn, id)?.ok_or_else(|| RecordsError::not_found(R::KIND, id))
}

/// All records (archived or not) whose relation column equals `value`
pub fn find_where<R: Record>(conn: &Connection, field: RelationField, value: &str) -> Result<Vec<R>> {
    let key = RelationKey::new(R::KIND, field).ok_or_else(|| {
        RecordsError::invalid(
            field.column(),
            format!("is not a relation of {}", R::KIND.label()),
        )
    })?;

    let sql = format!(
        "{} WHERE {} = ?1 ORDER BY name COLLATE NOCASE, id",
        select_sql::<R>(),
        key.column()
    );
    query_records(conn, &sql, vec![Value::Text(value.to_string())])
}

/// Non-archived records matching every `(relation, value)` pair
pub fn list_matching<R: Record>(conn: &Connection, filters: &[(RelationField, String)]) -> Result<Vec<R>> {
    let mut clauses = vec!["archived = 0".to_string()];
    let mut args = Vec::with_capacity(filters.len());

    for (field, value) in filters {
        let key = RelationKey::new(R::KIND, *field).ok_or_else(|| {
            RecordsError::invalid(
                field.column(),
                format!("is not a relation of {}", R::KIND.label()),
            )
        })?;
        clauses.push(format!("{} = ?{}", key.column(), args.len() + 1));
        args.push(Value::Text(value.clone()));
    }

    let sql = format!(
        "{} WHERE {} ORDER BY name COLLATE NOCASE, id",
        select_sql::<R>(),
        clauses.join(" AND ")
    );
    query_records(conn, &sql, args)
}

/// Count of non-archived rows for a kind
pub fn count_active(conn: &Connection, kind: EntityKind) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE archived = 0", kind.table());
    let count = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// WRITES
// ============================================================================

/// Build, validate and insert a new record
pub fn create<R: Record>(conn: &Connection, new: R::New) -> Result<R> {
    let now = Utc::now();
    let mut record = R::from_new(new, uuid::Uuid::new_v4().to_string(), now);

    let lifecycle = lifecycle::normalize(R::KIND, &record.lifecycle())
        .map_err(|e| RecordsError::from_field_errors(vec![e]))?;
    record.set_lifecycle(&lifecycle);

    check(&record)?;
    insert(conn, &record)?;
    Ok(record)
}

/// Merge a patch into `current`, set the lifecycle pair, validate, persist
pub fn apply_patch<R: Record>(
    conn: &Connection,
    current: &R,
    patch: R::Patch,
    lifecycle: &Lifecycle,
) -> Result<R> {
    let mut next = current.clone();
    next.apply(patch);
    next.set_lifecycle(lifecycle);
    next.touch(Utc::now());

    check(&next)?;
    save(conn, &next)?;
    Ok(next)
}

fn check<R: Record>(record: &R) -> Result<()> {
    let errors = record.validate();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(RecordsError::from_field_errors(errors))
    }
}

pub fn insert<R: Record>(conn: &Connection, record: &R) -> Result<()> {
    let placeholders: Vec<String> = (1..=R::COLUMNS.len() + 1)
        .map(|i| format!("?{}", i))
        .collect();
    let sql = format!(
        "INSERT INTO {} (id, {}) VALUES ({})",
        R::KIND.table(),
        R::COLUMNS.join(", "),
        placeholders.join(", ")
    );

    let mut args = vec![Value::Text(record.id().to_string())];
    args.extend(record.values());

    conn.execute(&sql, params_from_iter(args))
        .map_err(RecordsError::from_write)?;
    Ok(())
}

/// Overwrite every stored column of an existing record
pub fn save<R: Record>(conn: &Connection, record: &R) -> Result<()> {
    let assignments: Vec<String> = R::COLUMNS
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{} = ?{}", column, i + 1))
        .collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        R::KIND.table(),
        assignments.join(", "),
        R::COLUMNS.len() + 1
    );

    let mut args = record.values();
    args.push(Value::Text(record.id().to_string()));

    let changed = conn
        .execute(&sql, params_from_iter(args))
        .map_err(RecordsError::from_write)?;
    if changed == 0 {
        return Err(RecordsError::not_found(R::KIND, record.id()));
    }
    Ok(())
}

pub fn delete<R: Record>(conn: &Connection, id: &str) -> Result<usize> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", R::KIND.table());
    let deleted = conn.execute(&sql, [id])?;
    Ok(deleted)
}

// ============================================================================
// BULK (cascade targets)
// ============================================================================

/// Move every row naming `value` to `state`, skipping rows already there.
///
/// Returns the number of rows that actually changed.
pub fn bulk_set_lifecycle(
    conn: &Connection,
    key: RelationKey,
    value: &str,
    state: LifecycleState,
    now: DateTime<Utc>,
) -> Result<usize> {
    let target = Lifecycle::for_state(key.kind(), state);
    let table = key.kind().table();
    let column = key.column();
    let now = now.to_rfc3339();

    let changed = match target.status {
        Some(status) => conn.execute(
            &format!(
                "UPDATE {} SET archived = ?1, status = ?2, updated_at = ?3
                 WHERE {} = ?4 AND archived <> ?1",
                table, column
            ),
            params![target.archived, status, now, value],
        )?,
        None => conn.execute(
            &format!(
                "UPDATE {} SET archived = ?1, updated_at = ?2
                 WHERE {} = ?3 AND archived <> ?1",
                table, column
            ),
            params![target.archived, now, value],
        )?,
    };

    Ok(changed)
}

/// Hard-delete every row naming `value`, archived or not
pub fn bulk_delete(conn: &Connection, key: RelationKey, value: &str) -> Result<usize> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?1",
        key.kind().table(),
        key.column()
    );
    let deleted = conn.execute(&sql, [value])?;
    Ok(deleted)
}
