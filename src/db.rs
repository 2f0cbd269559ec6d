use rusqlite::Connection;
use std::path::Path;

use crate::error::Result;

/// Open (or create) the records database and make sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Entity Tables
    // Relationship columns hold the parent's *name*, not its id.
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS departments (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            head TEXT,
            email TEXT,
            description TEXT,
            status TEXT NOT NULL DEFAULT 'Active',
            archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            code TEXT,
            description TEXT,
            department TEXT NOT NULL,
            credits INTEGER NOT NULL DEFAULT 3,
            status TEXT NOT NULL DEFAULT 'active',
            archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS academic_years (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            start_date TEXT,
            end_date TEXT,
            description TEXT,
            archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS faculty (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            phone TEXT,
            position TEXT,
            department TEXT NOT NULL,
            subject TEXT,
            academic_year TEXT,
            archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            phone TEXT,
            department TEXT NOT NULL,
            course TEXT,
            academic_year TEXT,
            year_level INTEGER,
            archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Activity Log (append-only; id is the ordering key)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user TEXT NOT NULL,
            action TEXT NOT NULL,
            type TEXT NOT NULL,
            details TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Admin Profile (single row)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS admin_profile (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            salt TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes (cascade lookups filter on relation column + archived)
    // ==========================================================================
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_courses_department ON courses(department, archived);
         CREATE INDEX IF NOT EXISTS idx_faculty_department ON faculty(department, archived);
         CREATE INDEX IF NOT EXISTS idx_faculty_subject ON faculty(subject, archived);
         CREATE INDEX IF NOT EXISTS idx_faculty_academic_year ON faculty(academic_year, archived);
         CREATE INDEX IF NOT EXISTS idx_students_department ON students(department, archived);
         CREATE INDEX IF NOT EXISTS idx_students_course ON students(course, archived);
         CREATE INDEX IF NOT EXISTS idx_students_academic_year ON students(academic_year, archived);",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('departments', 'courses', 'academic_years', 'faculty', 'students', 'logs', 'admin_profile')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(tables, 7);
    }

    #[test]
    fn test_open_database_creates_parent_dir() {
        let dir = std::env::temp_dir().join(format!("school-records-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("records.db");

        let conn = open_database(&path).unwrap();
        drop(conn);

        assert!(path.exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
