// 📊 Stats Aggregator - read-only counts over non-archived records

use rusqlite::Connection;
use serde::Serialize;

use crate::entities::{EntityKind, RelationField, RelationKey};
use crate::error::{RecordsError, Result};
use crate::store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchoolStats {
    pub total_students: i64,
    pub total_faculty: i64,
    pub total_courses: i64,
    pub total_departments: i64,
    pub total_academic_years: i64,
    pub students_by_department: Vec<GroupCount>,
    pub faculty_by_department: Vec<GroupCount>,
    pub students_by_course: Vec<GroupCount>,
    pub courses_by_department: Vec<GroupCount>,
}

pub fn school_stats(conn: &Connection) -> Result<SchoolStats> {
    Ok(SchoolStats {
        total_students: store::count_active(conn, EntityKind::Student)?,
        total_faculty: store::count_active(conn, EntityKind::Faculty)?,
        total_courses: store::count_active(conn, EntityKind::Course)?,
        total_departments: store::count_active(conn, EntityKind::Department)?,
        total_academic_years: store::count_active(conn, EntityKind::AcademicYear)?,
        students_by_department: group_by(conn, EntityKind::Student, RelationField::Department)?,
        faculty_by_department: group_by(conn, EntityKind::Faculty, RelationField::Department)?,
        students_by_course: group_by(conn, EntityKind::Student, RelationField::Course)?,
        courses_by_department: group_by(conn, EntityKind::Course, RelationField::Department)?,
    })
}

/// Non-archived rows of `kind` grouped by a relation column.
///
/// Rows with no value in the column are left out. Largest groups first.
pub fn group_by(conn: &Connection, kind: EntityKind, field: RelationField) -> Result<Vec<GroupCount>> {
    let key = RelationKey::new(kind, field).ok_or_else(|| {
        RecordsError::invalid(field.column(), format!("is not a relation of {}", kind.label()))
    })?;
    let column = key.column();

    let mut stmt = conn.prepare(&format!(
        "SELECT {col}, COUNT(*) as count
         FROM {table}
         WHERE archived = 0 AND {col} IS NOT NULL AND {col} <> ''
         GROUP BY {col}
         ORDER BY count DESC, {col}",
        col = column,
        table = kind.table()
    ))?;

    let groups = stmt
        .query_map([], |row| {
            Ok(GroupCount {
                name: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(groups)
}
