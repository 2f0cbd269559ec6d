// 📚 Course Entity
//
// Belongs to a department by name. Students (`course`) and faculty
// (`subject`) name a course, so archiving one cascades to both.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::{
    clean, clean_opt, flag, opt_text, require, stamp, text, timestamp, EntityKind, Record,
};
use crate::error::FieldError;
use crate::lifecycle::{Lifecycle, LifecyclePatch, LifecycleSignal, COURSE_STATUSES};

pub const DEFAULT_CREDITS: i64 = 3;
pub const MAX_CREDITS: i64 = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,

    /// Department.name this course belongs to
    pub department: String,
    pub credits: i64,

    /// "active" | "archived", kept in step with `archived`
    pub status: String,
    pub archived: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCourse {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub department: String,
    #[serde(default)]
    pub credits: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoursePatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub department: Option<String>,
    pub credits: Option<i64>,
    pub status: Option<String>,
    pub archived: Option<bool>,
}

impl LifecyclePatch for CoursePatch {
    fn signal(&self) -> LifecycleSignal {
        LifecycleSignal {
            archived: self.archived,
            status: self.status.clone(),
        }
    }
}

impl Record for Course {
    const KIND: EntityKind = EntityKind::Course;
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "code",
        "description",
        "department",
        "credits",
        "status",
        "archived",
        "created_at",
        "updated_at",
    ];

    type New = NewCourse;
    type Patch = CoursePatch;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Course {
            id: row.get(0)?,
            name: row.get(1)?,
            code: row.get(2)?,
            description: row.get(3)?,
            department: row.get(4)?,
            credits: row.get(5)?,
            status: row.get(6)?,
            archived: row.get(7)?,
            created_at: timestamp(row, 8)?,
            updated_at: timestamp(row, 9)?,
        })
    }

    fn from_new(new: NewCourse, id: String, now: DateTime<Utc>) -> Self {
        Course {
            id,
            name: clean(new.name),
            code: clean_opt(new.code),
            description: clean_opt(new.description),
            department: clean(new.department),
            credits: new.credits.unwrap_or(DEFAULT_CREDITS),
            status: clean_opt(new.status).unwrap_or_else(|| COURSE_STATUSES.active.to_string()),
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: CoursePatch) {
        if let Some(name) = patch.name {
            self.name = clean(name);
        }
        if let Some(code) = patch.code {
            self.code = clean_opt(Some(code));
        }
        if let Some(description) = patch.description {
            self.description = clean_opt(Some(description));
        }
        if let Some(department) = patch.department {
            self.department = clean(department);
        }
        if let Some(credits) = patch.credits {
            self.credits = credits;
        }
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require(&mut errors, "name", &self.name);
        require(&mut errors, "department", &self.department);
        if !(0..=MAX_CREDITS).contains(&self.credits) {
            errors.push(FieldError::new(
                "credits",
                format!("must be between 0 and {}", MAX_CREDITS),
            ));
        }
        errors
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            opt_text(&self.code),
            opt_text(&self.description),
            text(&self.department),
            Value::Integer(self.credits),
            text(&self.status),
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
        Lifecycle::with_status(self.archived, &self.status)
    }

    fn set_lifecycle(&mut self, lifecycle: &Lifecycle) {
        self.archived = lifecycle.archived;
        if let Some(status) = &lifecycle.status {
            self.status = status.clone();
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
