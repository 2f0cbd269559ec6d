// 📝 Activity Log - append-only audit trail of admin actions
//
// One entry per externally meaningful action. Mutation paths write through
// `record_best_effort`: a failed log write is traced, never returned.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RecordsError, Result};

/// Default page size for the log listing
pub const DEFAULT_PAGE_SIZE: usize = 100;

pub const DEFAULT_USER: &str = "Admin";

// ============================================================================
// ACTION + STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogAction {
    Created,
    Updated,
    Deleted,
    Archived,
    Restored,
    Error,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::Created => "Created",
            LogAction::Updated => "Updated",
            LogAction::Deleted => "Deleted",
            LogAction::Archived => "Archived",
            LogAction::Restored => "Restored",
            LogAction::Error => "Error",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Created" => Some(LogAction::Created),
            "Updated" => Some(LogAction::Updated),
            "Deleted" => Some(LogAction::Deleted),
            "Archived" => Some(LogAction::Archived),
            "Restored" => Some(LogAction::Restored),
            "Error" => Some(LogAction::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    #[default]
    Success,
    Warning,
    Error,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Warning => "warning",
            LogStatus::Error => "error",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "success" => Some(LogStatus::Success),
            "warning" => Some(LogStatus::Warning),
            "error" => Some(LogStatus::Error),
            _ => None,
        }
    }
}

// ============================================================================
// ENTRIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub user: String,
    pub action: LogAction,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub details: String,
    pub status: LogStatus,
    pub created_at: DateTime<Utc>,
}

/// An entry waiting to be appended (also the `POST /logs` body)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLogEntry {
    pub action: LogAction,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub details: String,
    #[serde(default)]
    pub status: LogStatus,
    #[serde(default = "default_user")]
    pub user: String,
}

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

impl NewLogEntry {
    pub fn new(action: LogAction, entity_type: &str, details: impl Into<String>) -> Self {
        NewLogEntry {
            action,
            entity_type: entity_type.to_string(),
            details: details.into(),
            status: LogStatus::Success,
            user: default_user(),
        }
    }

    pub fn with_status(mut self, status: LogStatus) -> Self {
        self.status = status;
        self
    }

    pub fn by(mut self, user: &str) -> Self {
        self.user = user.to_string();
        self
    }
}

// ============================================================================
// RECORDER
// ============================================================================

/// Append an entry
pub fn record(conn: &Connection, entry: &NewLogEntry) -> Result<LogEntry> {
    if entry.entity_type.trim().is_empty() {
        return Err(RecordsError::invalid("type", "is required"));
    }
    if entry.details.trim().is_empty() {
        return Err(RecordsError::invalid("details", "is required"));
    }

    let created_at = Utc::now();
    let user = if entry.user.trim().is_empty() {
        DEFAULT_USER
    } else {
        entry.user.trim()
    };

    conn.execute(
        "INSERT INTO logs (user, action, type, details, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user,
            entry.action.as_str(),
            entry.entity_type,
            entry.details,
            entry.status.as_str(),
            created_at.to_rfc3339(),
        ],
    )?;

    Ok(LogEntry {
        id: conn.last_insert_rowid(),
        user: user.to_string(),
        action: entry.action,
        entity_type: entry.entity_type.clone(),
        details: entry.details.clone(),
        status: entry.status,
        created_at,
    })
}

/// Append an entry from a mutation path; failures are traced and swallowed
pub fn record_best_effort(conn: &Connection, entry: &NewLogEntry) -> Option<LogEntry> {
    match record(conn, entry) {
        Ok(logged) => Some(logged),
        Err(e) => {
            tracing::warn!(
                action = entry.action.as_str(),
                entity_type = %entry.entity_type,
                error = %e,
                "activity log write failed"
            );
            None
        }
    }
}

/// Most recent entries first
pub fn list_recent(conn: &Connection, limit: usize) -> Result<Vec<LogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, user, action, type, details, status, created_at
         FROM logs
         ORDER BY id DESC
         LIMIT ?1",
    )?;

    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let entries = stmt
        .query_map([limit], row_to_entry)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(entries)
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<LogEntry>> {
    let entry = conn
        .query_row(
            "SELECT id, user, action, type, details, status, created_at
             FROM logs WHERE id = ?1",
            [id],
            row_to_entry,
        )
        .optional()?;
    Ok(entry)
}

/// Delete one entry; returns whether it existed
pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM logs WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

/// Remove every entry; returns how many were removed
pub fn clear(conn: &Connection) -> Result<usize> {
    let removed = conn.execute("DELETE FROM logs", [])?;
    Ok(removed)
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LogEntry> {
    let action: String = row.get(2)?;
    let status: String = row.get(5)?;
    let created_at: String = row.get(6)?;

    Ok(LogEntry {
        id: row.get(0)?,
        user: row.get(1)?,
        // Rows are only written through `record`, unknown words fall back rather than fail
        action: LogAction::parse(&action).unwrap_or(LogAction::Error),
        entity_type: row.get(3)?,
        details: row.get(4)?,
        status: LogStatus::parse(&status).unwrap_or(LogStatus::Warning),
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
            })?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_record_defaults() {
        let conn = conn();
        let entry = record(
            &conn,
            &NewLogEntry::new(LogAction::Created, "Student", "Created student: Ana"),
        )
        .unwrap();

        assert_eq!(entry.user, "Admin");
        assert_eq!(entry.status, LogStatus::Success);
        assert_eq!(get(&conn, entry.id).unwrap(), Some(entry));
    }

    #[test]
    fn test_list_recent_is_newest_first_and_capped() {
        let conn = conn();
        for i in 0..5 {
            record(
                &conn,
                &NewLogEntry::new(LogAction::Updated, "Course", format!("Updated course: C{}", i)),
            )
            .unwrap();
        }

        let recent = list_recent(&conn, 3).unwrap();
        let details: Vec<&str> = recent.iter().map(|e| e.details.as_str()).collect();
        assert_eq!(
            details,
            vec!["Updated course: C4", "Updated course: C3", "Updated course: C2"]
        );
    }

    #[test]
    fn test_delete_and_clear() {
        let conn = conn();
        let first = record(&conn, &NewLogEntry::new(LogAction::Deleted, "Faculty", "Deleted faculty: X")).unwrap();
        record(&conn, &NewLogEntry::new(LogAction::Deleted, "Faculty", "Deleted faculty: Y")).unwrap();

        assert!(delete(&conn, first.id).unwrap());
        assert!(!delete(&conn, first.id).unwrap());
        assert_eq!(clear(&conn).unwrap(), 1);
        assert!(list_recent(&conn, DEFAULT_PAGE_SIZE).unwrap().is_empty());
    }

    #[test]
    fn test_ids_keep_increasing_after_clear() {
        let conn = conn();
        let before = record(&conn, &NewLogEntry::new(LogAction::Created, "Student", "a")).unwrap();
        clear(&conn).unwrap();
        let after = record(&conn, &NewLogEntry::new(LogAction::Created, "Student", "b")).unwrap();

        assert!(after.id > before.id);
    }

    #[test]
    fn test_record_requires_details() {
        let conn = conn();
        let err = record(&conn, &NewLogEntry::new(LogAction::Error, "Student", "  ")).unwrap_err();
        assert!(matches!(err, RecordsError::Validation(_)));
    }

    #[test]
    fn test_best_effort_swallows_failure() {
        let conn = conn();
        conn.execute("DROP TABLE logs", []).unwrap();

        let logged = record_best_effort(
            &conn,
            &NewLogEntry::new(LogAction::Archived, "Department", "Archived department: X"),
        );
        assert!(logged.is_none());
    }

    #[test]
    fn test_post_body_defaults() {
        let body: NewLogEntry = serde_json::from_str(
            r#"{"action": "Error", "type": "Student", "details": "Upload failed"}"#,
        )
        .unwrap();

        assert_eq!(body.user, "Admin");
        assert_eq!(body.status, LogStatus::Success);

        let bad = serde_json::from_str::<NewLogEntry>(
            r#"{"action": "Exploded", "type": "Student", "details": "x"}"#,
        );
        assert!(bad.is_err());
    }
}
