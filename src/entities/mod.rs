// 🏫 Entity Models - Students, Faculty, Courses, Departments, Academic Years
//
// Each entity has:
// - Stable identity (UUID) assigned at creation
// - A display `name` that other records point at by string
// - A lifecycle pair (`archived`, plus `status` for Course/Department)

pub mod academic_year;
pub mod course;
pub mod department;
pub mod faculty;
pub mod student;

pub use academic_year::{AcademicYear, AcademicYearPatch, NewAcademicYear};
pub use course::{Course, CoursePatch, NewCourse};
pub use department::{Department, DepartmentPatch, NewDepartment};
pub use faculty::{Faculty, FacultyPatch, NewFaculty};
pub use student::{NewStudent, Student, StudentPatch};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FieldError;
use crate::lifecycle::{Lifecycle, LifecyclePatch, StatusVocabulary, COURSE_STATUSES, DEPARTMENT_STATUSES};

// ============================================================================
// ENTITY KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Student,
    Faculty,
    Course,
    Department,
    AcademicYear,
}

impl EntityKind {
    /// Label written to the log `type` column
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Student => "Student",
            EntityKind::Faculty => "Faculty",
            EntityKind::Course => "Course",
            EntityKind::Department => "Department",
            EntityKind::AcademicYear => "Academic Year",
        }
    }

    /// Lower-case noun used inside log details
    pub fn noun(&self) -> &'static str {
        match self {
            EntityKind::Student => "student",
            EntityKind::Faculty => "faculty",
            EntityKind::Course => "course",
            EntityKind::Department => "department",
            EntityKind::AcademicYear => "academic year",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Student => "students",
            EntityKind::Faculty => "faculty",
            EntityKind::Course => "courses",
            EntityKind::Department => "departments",
            EntityKind::AcademicYear => "academic_years",
        }
    }

    /// Path segment under `/api`
    pub fn slug(&self) -> &'static str {
        match self {
            EntityKind::Student => "students",
            EntityKind::Faculty => "faculty",
            EntityKind::Course => "courses",
            EntityKind::Department => "departments",
            EntityKind::AcademicYear => "academic-years",
        }
    }

    /// "3 course(s)", "1 faculty", ...
    pub fn count_label(&self, count: usize) -> String {
        match self {
            EntityKind::Student => format!("{} student(s)", count),
            EntityKind::Faculty => format!("{} faculty", count),
            EntityKind::Course => format!("{} course(s)", count),
            EntityKind::Department => format!("{} department(s)", count),
            EntityKind::AcademicYear => format!("{} academic year(s)", count),
        }
    }

    pub fn status_vocabulary(&self) -> Option<StatusVocabulary> {
        match self {
            EntityKind::Course => Some(COURSE_STATUSES),
            EntityKind::Department => Some(DEPARTMENT_STATUSES),
            _ => None,
        }
    }

    /// String columns on this kind that name a parent record
    pub fn relation_fields(&self) -> &'static [RelationField] {
        match self {
            EntityKind::Student => &[
                RelationField::Department,
                RelationField::Course,
                RelationField::AcademicYear,
            ],
            EntityKind::Faculty => &[
                RelationField::Department,
                RelationField::Subject,
                RelationField::AcademicYear,
            ],
            EntityKind::Course => &[RelationField::Department],
            EntityKind::Department | EntityKind::AcademicYear => &[],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// RELATION KEYS
// ============================================================================

/// A child column holding a parent's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationField {
    Department,
    Course,
    Subject,
    AcademicYear,
}

impl RelationField {
    pub fn column(&self) -> &'static str {
        match self {
            RelationField::Department => "department",
            RelationField::Course => "course",
            RelationField::Subject => "subject",
            RelationField::AcademicYear => "academic_year",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        match column {
            "department" => Some(RelationField::Department),
            "course" => Some(RelationField::Course),
            "subject" => Some(RelationField::Subject),
            "academic_year" => Some(RelationField::AcademicYear),
            _ => None,
        }
    }
}

/// (kind, column) pair the store is allowed to filter and bulk-write on.
///
/// Only combinations listed by `EntityKind::relation_fields` can be built,
/// so column names reaching SQL always come from this table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationKey {
    kind: EntityKind,
    field: RelationField,
}

impl RelationKey {
    pub fn new(kind: EntityKind, field: RelationField) -> Option<Self> {
        if kind.relation_fields().contains(&field) {
            Some(RelationKey { kind, field })
        } else {
            None
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn column(&self) -> &'static str {
        self.field.column()
    }
}

// ============================================================================
// RECORD TRAIT
// ============================================================================

/// A persisted entity the generic store and cascade engine can drive.
pub trait Record: Clone + Serialize + Send + 'static {
    const KIND: EntityKind;

    /// Stored columns after `id`, in `values()` order
    const COLUMNS: &'static [&'static str];

    /// Create body
    type New: DeserializeOwned + Send + 'static;

    /// Partial update body
    type Patch: DeserializeOwned + LifecyclePatch + Send + 'static;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn from_new(new: Self::New, id: String, now: DateTime<Utc>) -> Self;

    /// Merge descriptive fields; lifecycle fields are left to the engine.
    fn apply(&mut self, patch: Self::Patch);

    fn validate(&self) -> Vec<FieldError>;

    fn values(&self) -> Vec<Value>;

    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn lifecycle(&self) -> Lifecycle;

    fn set_lifecycle(&mut self, lifecycle: &Lifecycle);

    fn touch(&mut self, now: DateTime<Utc>);
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

pub(crate) fn clean(value: String) -> String {
    value.trim().to_string()
}

/// Trim, and treat blank as absent
pub(crate) fn clean_opt(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn require(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "is required"));
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !email.chars().any(char::is_whitespace)
}

pub(crate) fn check_email(errors: &mut Vec<FieldError>, field: &str, email: &str) {
    if !is_valid_email(email) {
        errors.push(FieldError::new(field, "is not a valid email address"));
    }
}

pub(crate) fn parse_date(errors: &mut Vec<FieldError>, field: &str, value: &Option<String>) -> Option<NaiveDate> {
    let raw = value.as_deref()?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(FieldError::new(field, "must be a date formatted YYYY-MM-DD"));
            None
        }
    }
}

pub(crate) fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

pub(crate) fn opt_text(value: &Option<String>) -> Value {
    match value {
        Some(v) => Value::Text(v.clone()),
        None => Value::Null,
    }
}

pub(crate) fn opt_int(value: Option<i64>) -> Value {
    match value {
        Some(v) => Value::Integer(v),
        None => Value::Null,
    }
}

pub(crate) fn flag(value: bool) -> Value {
    Value::Integer(i64::from(value))
}

pub(crate) fn stamp(value: &DateTime<Utc>) -> Value {
    Value::Text(value.to_rfc3339())
}

/// Read an RFC 3339 column written by `stamp`
pub(crate) fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_keys_follow_declared_fields() {
        assert!(RelationKey::new(EntityKind::Student, RelationField::Course).is_some());
        assert!(RelationKey::new(EntityKind::Faculty, RelationField::Subject).is_some());
        assert!(RelationKey::new(EntityKind::Course, RelationField::Department).is_some());

        // Students have no `subject` column, departments name nothing
        assert!(RelationKey::new(EntityKind::Student, RelationField::Subject).is_none());
        assert!(RelationKey::new(EntityKind::Department, RelationField::Department).is_none());
    }

    #[test]
    fn test_relation_field_columns() {
        for field in [
            RelationField::Department,
            RelationField::Course,
            RelationField::Subject,
            RelationField::AcademicYear,
        ] {
            assert_eq!(RelationField::from_column(field.column()), Some(field));
        }
        assert_eq!(RelationField::from_column("name"), None);
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("daniel.martinez@school.edu"));
        assert!(!is_valid_email("daniel.martinez"));
        assert!(!is_valid_email("@school.edu"));
        assert!(!is_valid_email("daniel@school"));
        assert!(!is_valid_email("dan iel@school.edu"));
    }

    #[test]
    fn test_count_labels() {
        assert_eq!(EntityKind::Course.count_label(2), "2 course(s)");
        assert_eq!(EntityKind::Faculty.count_label(1), "1 faculty");
        assert_eq!(EntityKind::Student.count_label(0), "0 student(s)");
    }

    #[test]
    fn test_clean_opt_drops_blank() {
        assert_eq!(clean_opt(Some("  ".to_string())), None);
        assert_eq!(clean_opt(Some(" BSCE ".to_string())), Some("BSCE".to_string()));
        assert_eq!(clean_opt(None), None);
    }
}
