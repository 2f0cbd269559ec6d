// 🎓 Student Entity
//
// Leaf of the hierarchy: a student names its department, course and
// academic year, and nothing names a student.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::{
    check_email, clean, clean_opt, flag, opt_int, opt_text, require, stamp, text, timestamp,
    EntityKind, Record,
};
use crate::error::FieldError;
use crate::lifecycle::{Lifecycle, LifecyclePatch, LifecycleSignal};

pub const MAX_YEAR_LEVEL: i64 = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,

    /// Unique across students
    pub email: String,
    pub phone: Option<String>,

    // Parent names (matched by string, not id)
    pub department: String,
    pub course: Option<String>,
    pub academic_year: Option<String>,

    pub year_level: Option<i64>,
    pub archived: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub department: String,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub year_level: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub course: Option<String>,
    pub academic_year: Option<String>,
    pub year_level: Option<i64>,
    pub archived: Option<bool>,
}

impl LifecyclePatch for StudentPatch {
    fn signal(&self) -> LifecycleSignal {
        LifecycleSignal {
            archived: self.archived,
            status: None,
        }
    }
}

impl Record for Student {
    const KIND: EntityKind = EntityKind::Student;
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "email",
        "phone",
        "department",
        "course",
        "academic_year",
        "year_level",
        "archived",
        "created_at",
        "updated_at",
    ];

    type New = NewStudent;
    type Patch = StudentPatch;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Student {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            department: row.get(4)?,
            course: row.get(5)?,
            academic_year: row.get(6)?,
            year_level: row.get(7)?,
            archived: row.get(8)?,
            created_at: timestamp(row, 9)?,
            updated_at: timestamp(row, 10)?,
        })
    }

    fn from_new(new: NewStudent, id: String, now: DateTime<Utc>) -> Self {
        Student {
            id,
            name: clean(new.name),
            email: clean(new.email).to_lowercase(),
            phone: clean_opt(new.phone),
            department: clean(new.department),
            course: clean_opt(new.course),
            academic_year: clean_opt(new.academic_year),
            year_level: new.year_level,
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: StudentPatch) {
        if let Some(name) = patch.name {
            self.name = clean(name);
        }
        if let Some(email) = patch.email {
            self.email = clean(email).to_lowercase();
        }
        if let Some(phone) = patch.phone {
            self.phone = clean_opt(Some(phone));
        }
        if let Some(department) = patch.department {
            self.department = clean(department);
        }
        if let Some(course) = patch.course {
            self.course = clean_opt(Some(course));
        }
        if let Some(academic_year) = patch.academic_year {
            self.academic_year = clean_opt(Some(academic_year));
        }
        if let Some(year_level) = patch.year_level {
            self.year_level = Some(year_level);
        }
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require(&mut errors, "name", &self.name);
        require(&mut errors, "email", &self.email);
        if !self.email.is_empty() {
            check_email(&mut errors, "email", &self.email);
        }
        require(&mut errors, "department", &self.department);
        if let Some(level) = self.year_level {
            if !(1..=MAX_YEAR_LEVEL).contains(&level) {
                errors.push(FieldError::new(
                    "year_level",
                    format!("must be between 1 and {}", MAX_YEAR_LEVEL),
                ));
            }
        }
        errors
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            text(&self.email),
            opt_text(&self.phone),
            text(&self.department),
            opt_text(&self.course),
            opt_text(&self.academic_year),
            opt_int(self.year_level),
            flag(self.archived),
            stamp(&self.created_at),
            stamp(&self.updated_at),
        ]
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn lifecycle(&self) -> Lifecycle {
        Lifecycle::plain(self.archived)
    }

    fn set_lifecycle(&mut self, lifecycle: &Lifecycle) {
        self.archived = lifecycle.archived;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daniel() -> Student {
        Student::from_new(
            NewStudent {
                name: "Daniel Martinez".to_string(),
                email: "Daniel.Martinez@School.edu ".to_string(),
                department: "Engineering".to_string(),
                course: Some("BSCE".to_string()),
                year_level: Some(2),
                ..Default::default()
            },
            "student-1".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn test_new_student_normalizes_email() {
        let student = daniel();
        assert_eq!(student.email, "daniel.martinez@school.edu");
        assert!(!student.archived);
        assert!(student.validate().is_empty());
    }

    #[test]
    fn test_year_level_range() {
        let mut student = daniel();
        student.apply(StudentPatch {
            year_level: Some(0),
            ..Default::default()
        });
        assert_eq!(student.validate()[0].field, "year_level");
    }

    #[test]
    fn test_missing_email_reported_once() {
        let mut student = daniel();
        student.email = String::new();

        let errors = student.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "is required");
    }

    #[test]
    fn test_student_signal_has_no_status() {
        let patch = StudentPatch {
            archived: Some(true),
            ..Default::default()
        };
        assert_eq!(patch.signal().status, None);
    }
}
