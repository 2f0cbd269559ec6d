// 🏛️ Department Entity - top of the cascade hierarchy
//
// Courses, faculty and students name their department by string. Archiving
// or deleting a department fans out to all three.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::{
    check_email, clean, clean_opt, flag, opt_text, require, stamp, text, timestamp, EntityKind,
    Record,
};
use crate::error::FieldError;
use crate::lifecycle::{Lifecycle, LifecyclePatch, LifecycleSignal, DEPARTMENT_STATUSES};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
    pub head: Option<String>,
    pub email: Option<String>,
    pub description: Option<String>,

    /// "Active" | "Deactivated" | "Archived", kept in step with `archived`
    pub status: String,
    pub archived: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDepartment {
    pub name: String,
    #[serde(default)]
    pub head: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentPatch {
    pub name: Option<String>,
    pub head: Option<String>,
    pub email: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub archived: Option<bool>,
}

impl LifecyclePatch for DepartmentPatch {
    fn signal(&self) -> LifecycleSignal {
        LifecycleSignal {
            archived: self.archived,
            status: self.status.clone(),
        }
    }
}

impl Record for Department {
    const KIND: EntityKind = EntityKind::Department;
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "head",
        "email",
        "description",
        "status",
        "archived",
        "created_at",
        "updated_at",
    ];

    type New = NewDepartment;
    type Patch = DepartmentPatch;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Department {
            id: row.get(0)?,
            name: row.get(1)?,
            head: row.get(2)?,
            email: row.get(3)?,
            description: row.get(4)?,
            status: row.get(5)?,
            archived: row.get(6)?,
            created_at: timestamp(row, 7)?,
            updated_at: timestamp(row, 8)?,
        })
    }

    fn from_new(new: NewDepartment, id: String, now: DateTime<Utc>) -> Self {
        Department {
            id,
            name: clean(new.name),
            head: clean_opt(new.head),
            email: clean_opt(new.email),
            description: clean_opt(new.description),
            status: clean_opt(new.status).unwrap_or_else(|| DEPARTMENT_STATUSES.active.to_string()),
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: DepartmentPatch) {
        if let Some(name) = patch.name {
            self.name = clean(name);
        }
        if let Some(head) = patch.head {
            self.head = clean_opt(Some(head));
        }
        if let Some(email) = patch.email {
            self.email = clean_opt(Some(email));
        }
        if let Some(description) = patch.description {
            self.description = clean_opt(Some(description));
        }
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require(&mut errors, "name", &self.name);
        if let Some(email) = &self.email {
            check_email(&mut errors, "email", email);
        }
        errors
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            opt_text(&self.head),
            opt_text(&self.email),
            opt_text(&self.description),
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
