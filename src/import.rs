// 📥 CSV Student Import
//
// Each row goes through the cascade engine's create path, so it is validated
// and logged exactly like a create from the API. Bad rows are reported and
// skipped; a storage failure aborts the import.

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::io;
use std::path::Path;

use crate::cascade::CascadeEngine;
use crate::entities::{NewStudent, Student};

/// Expected header: name,email,phone,department,course,academic_year,year_level
#[derive(Debug)]
pub struct StudentRow {
    /// 1-based line in the file (the header is line 1)
    pub line: usize,
    pub parsed: std::result::Result<NewStudent, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub rejected: Vec<RejectedRow>,
}

pub fn read_students<R: io::Read>(reader: R) -> Vec<StudentRow> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    rdr.deserialize::<NewStudent>()
        .enumerate()
        .map(|(i, result)| StudentRow {
            line: i + 2,
            parsed: result.map_err(|e| e.to_string()),
        })
        .collect()
}

pub fn load_students_csv(path: &Path) -> Result<Vec<StudentRow>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;
    Ok(read_students(file))
}

pub fn import_students(
    engine: &CascadeEngine,
    conn: &mut Connection,
    rows: Vec<StudentRow>,
) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    for row in rows {
        let new = match row.parsed {
            Ok(new) => new,
            Err(reason) => {
                report.rejected.push(RejectedRow { line: row.line, reason });
                continue;
            }
        };

        match engine.create::<Student>(conn, new) {
            Ok(_) => report.created += 1,
            Err(e) if e.is_internal() => {
                return Err(e).with_context(|| format!("Import stopped at line {}", row.line));
            }
            Err(e) => report.rejected.push(RejectedRow {
                line: row.line,
                reason: e.to_string(),
            }),
        }
    }

    tracing::info!(
        created = report.created,
        rejected = report.rejected.len(),
        "student import finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use crate::store;

    const CSV: &str = "name,email,phone,department,course,academic_year,year_level
Daniel Martinez,daniel@school.edu,,Engineering,BSCE,2024-2025,2
Ava Chen, AVA@school.edu ,555-0100,Nursing,,,
No Email,,,Engineering,,,
Liam Ortiz,liam@school.edu,,Engineering,BSCE,,nine
Dup Daniel,daniel@school.edu,,Engineering,,,
";

    #[test]
    fn test_read_students_keeps_line_numbers() {
        let rows = read_students(CSV.as_bytes());
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].line, 2);

        let first = rows[0].parsed.as_ref().unwrap();
        assert_eq!(first.name, "Daniel Martinez");
        assert_eq!(first.year_level, Some(2));
        assert!(rows[3].parsed.is_err());
    }

    #[test]
    fn test_import_reports_created_and_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let report =
            import_students(&CascadeEngine::new(), &mut conn, read_students(CSV.as_bytes())).unwrap();

        assert_eq!(report.created, 2);
        let lines: Vec<usize> = report.rejected.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![4, 5, 6]);

        let students: Vec<Student> = store::list(&conn).unwrap();
        assert_eq!(students[0].email, "ava@school.edu");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_students_csv(Path::new("/nonexistent/students.csv")).is_err());
    }
}
