// School Records - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod activity_log;   // Audit trail of admin actions
pub mod admin;          // Single admin profile + password
pub mod cascade;        // Archive / restore / delete propagation
pub mod config;
pub mod db;
pub mod entities;       // Student, Faculty, Course, Department, AcademicYear
pub mod error;
pub mod import;         // CSV student import
pub mod lifecycle;      // archived + status as one state
pub mod stats;
pub mod store;          // Generic persistence over the entity tables

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use activity_log::{LogAction, LogEntry, LogStatus, NewLogEntry};
pub use admin::{AdminProfile, PasswordChange, ProfilePatch};
pub use cascade::{CascadeEngine, CascadeReport, DeleteOutcome, MutationOutcome};
pub use config::AppConfig;
pub use db::{open_database, setup_database};
pub use entities::{
    AcademicYear, AcademicYearPatch, NewAcademicYear,
    Course, CoursePatch, NewCourse,
    Department, DepartmentPatch, NewDepartment,
    Faculty, FacultyPatch, NewFaculty,
    Student, StudentPatch, NewStudent,
    EntityKind, Record, RelationField,
};
pub use error::{FieldError, RecordsError, Result};
pub use import::{import_students, load_students_csv, ImportReport};
pub use lifecycle::{LifecycleState, Transition};
pub use stats::{school_stats, GroupCount, SchoolStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
