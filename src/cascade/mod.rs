// 🌊 Cascade Engine - archive / restore / delete propagation
//
// A lifecycle transition on a parent record is applied to every dependent
// record whose relation column equals the parent's name, then summarized in
// one activity-log entry.
//
// Key invariants:
// 1. One level deep: only relations declared for the mutated kind fan out.
//    Archiving a department touches its courses, faculty and students
//    directly and never re-runs the course rule.
// 2. Guarded writes: archive/restore only count rows whose flag changed, so
//    repeating a transition reports zero.
// 3. Delete is unconditional: dependents are removed whatever their flag.

pub mod engine;
pub mod relations;
pub mod report;

pub use engine::{CascadeEngine, DeleteOutcome, MutationOutcome};
pub use relations::{dependents_of, Relation, RELATIONS};
pub use report::{CascadeCount, CascadeFailure, CascadeReport};
