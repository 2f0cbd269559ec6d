// 👩‍🏫 Faculty Entity
//
// Names a department, a subject (a Course.name) and an academic year.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::{
    check_email, clean, clean_opt, flag, opt_text, require, stamp, text, timestamp, EntityKind,
    Record,
};
use crate::error::FieldError;
use crate::lifecycle::{Lifecycle, LifecyclePatch, LifecycleSignal};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faculty {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: Option<String>,

    pub department: String,
    /// Course.name taught
    pub subject: Option<String>,
    pub academic_year: Option<String>,

    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewFaculty {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    pub department: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub academic_year: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FacultyPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub subject: Option<String>,
    pub academic_year: Option<String>,
    pub archived: Option<bool>,
}

impl LifecyclePatch for FacultyPatch {
    fn signal(&self) -> LifecycleSignal {
        LifecycleSignal {
            archived: self.archived,
            status: None,
        }
    }
}

impl Record for Faculty {
    const KIND: EntityKind = EntityKind::Faculty;
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "email",
        "phone",
        "position",
        "department",
        "subject",
        "academic_year",
        "archived",
        "created_at",
        "updated_at",
    ];

    type New = NewFaculty;
    type Patch = FacultyPatch;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Faculty {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            position: row.get(4)?,
            department: row.get(5)?,
            subject: row.get(6)?,
            academic_year: row.get(7)?,
            archived: row.get(8)?,
            created_at: timestamp(row, 9)?,
            updated_at: timestamp(row, 10)?,
        })
    }

    fn from_new(new: NewFaculty, id: String, now: DateTime<Utc>) -> Self {
        Faculty {
            id,
            name: clean(new.name),
            email: clean(new.email).to_lowercase(),
            phone: clean_opt(new.phone),
            position: clean_opt(new.position),
            department: clean(new.department),
            subject: clean_opt(new.subject),
            academic_year: clean_opt(new.academic_year),
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: FacultyPatch) {
        if let Some(name) = patch.name {
            self.name = clean(name);
        }
        if let Some(email) = patch.email {
            self.email = clean(email).to_lowercase();
        }
        if let Some(phone) = patch.phone {
            self.phone = clean_opt(Some(phone));
        }
        if let Some(position) = patch.position {
            self.position = clean_opt(Some(position));
        }
        if let Some(department) = patch.department {
            self.department = clean(department);
        }
        if let Some(subject) = patch.subject {
            self.subject = clean_opt(Some(subject));
        }
        if let Some(academic_year) = patch.academic_year {
            self.academic_year = clean_opt(Some(academic_year));
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
        errors
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            text(&self.email),
            opt_text(&self.phone),
            opt_text(&self.position),
            text(&self.department),
            opt_text(&self.subject),
            opt_text(&self.academic_year),
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
