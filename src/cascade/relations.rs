// Parent → child relation table.
//
// Relations match on names: renaming a parent leaves children pointing at
// the old name, and they stop cascading.

use crate::entities::{EntityKind, RelationField, RelationKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub parent: EntityKind,
    pub child: EntityKind,
    /// Column on `child` holding the parent's name
    pub field: RelationField,
}

impl Relation {
    pub fn key(&self) -> Option<RelationKey> {
        RelationKey::new(self.child, self.field)
    }
}

/// Listed in summary order: courses, then faculty, then students.
pub const RELATIONS: &[Relation] = &[
    Relation {
        parent: EntityKind::Department,
        child: EntityKind::Course,
        field: RelationField::Department,
    },
    Relation {
        parent: EntityKind::Department,
        child: EntityKind::Faculty,
        field: RelationField::Department,
    },
    Relation {
        parent: EntityKind::Department,
        child: EntityKind::Student,
        field: RelationField::Department,
    },
    Relation {
        parent: EntityKind::Course,
        child: EntityKind::Faculty,
        field: RelationField::Subject,
    },
    Relation {
        parent: EntityKind::Course,
        child: EntityKind::Student,
        field: RelationField::Course,
    },
    Relation {
        parent: EntityKind::AcademicYear,
        child: EntityKind::Faculty,
        field: RelationField::AcademicYear,
    },
    Relation {
        parent: EntityKind::AcademicYear,
        child: EntityKind::Student,
        field: RelationField::AcademicYear,
    },
];

pub fn dependents_of(parent: EntityKind) -> impl Iterator<Item = &'static Relation> {
    RELATIONS.iter().filter(move |r| r.parent == parent)
}
