// 📅 Academic Year Entity
//
// Students and faculty name the year they belong to ("2024-2025").

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::{
    clean, clean_opt, flag, opt_text, parse_date, require, stamp, text, timestamp, EntityKind,
    Record,
};
use crate::error::FieldError;
use crate::lifecycle::{Lifecycle, LifecyclePatch, LifecycleSignal};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicYear {
    pub id: String,
    pub name: String,

    /// ISO dates, YYYY-MM-DD
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,

    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAcademicYear {
    pub name: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AcademicYearPatch {
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
    pub archived: Option<bool>,
}

impl LifecyclePatch for AcademicYearPatch {
    fn signal(&self) -> LifecycleSignal {
        LifecycleSignal {
            archived: self.archived,
            status: None,
        }
    }
}

impl Record for AcademicYear {
    const KIND: EntityKind = EntityKind::AcademicYear;
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "start_date",
        "end_date",
        "description",
        "archived",
        "created_at",
        "updated_at",
    ];

    type New = NewAcademicYear;
    type Patch = AcademicYearPatch;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(AcademicYear {
            id: row.get(0)?,
            name: row.get(1)?,
            start_date: row.get(2)?,
            end_date: row.get(3)?,
            description: row.get(4)?,
            archived: row.get(5)?,
            created_at: timestamp(row, 6)?,
            updated_at: timestamp(row, 7)?,
        })
    }

    fn from_new(new: NewAcademicYear, id: String, now: DateTime<Utc>) -> Self {
        AcademicYear {
            id,
            name: clean(new.name),
            start_date: clean_opt(new.start_date),
            end_date: clean_opt(new.end_date),
            description: clean_opt(new.description),
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: AcademicYearPatch) {
        if let Some(name) = patch.name {
            self.name = clean(name);
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = clean_opt(Some(start_date));
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = clean_opt(Some(end_date));
        }
        if let Some(description) = patch.description {
            self.description = clean_opt(Some(description));
        }
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require(&mut errors, "name", &self.name);

        let start = parse_date(&mut errors, "start_date", &self.start_date);
        let end = parse_date(&mut errors, "end_date", &self.end_date);
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                errors.push(FieldError::new("end_date", "must not be before start_date"));
            }
        }
        errors
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            opt_text(&self.start_date),
            opt_text(&self.end_date),
            opt_text(&self.description),
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
