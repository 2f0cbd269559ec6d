// Cascade counts and the one-line log summary built from them.

use serde::Serialize;

use crate::activity_log::{LogAction, LogStatus, NewLogEntry};
use crate::entities::EntityKind;
use crate::lifecycle::Transition;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeCount {
    pub kind: EntityKind,
    pub count: usize,
}

/// A dependent kind whose bulk write failed and was rolled back alone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeFailure {
    pub kind: EntityKind,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub transition: Transition,
    pub cascaded: Vec<CascadeCount>,
    pub failures: Vec<CascadeFailure>,
}

impl CascadeReport {
    pub fn new(transition: Transition) -> Self {
        CascadeReport {
            transition,
            cascaded: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn push_count(&mut self, kind: EntityKind, count: usize) {
        self.cascaded.push(CascadeCount { kind, count });
    }

    pub fn push_failure(&mut self, kind: EntityKind, error: impl ToString) {
        self.failures.push(CascadeFailure {
            kind,
            error: error.to_string(),
        });
    }

    pub fn total(&self) -> usize {
        self.cascaded.iter().map(|c| c.count).sum()
    }

    pub fn count_for(&self, kind: EntityKind) -> usize {
        self.cascaded
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.count)
            .sum()
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn action(&self) -> LogAction {
        match self.transition {
            Transition::Archive => LogAction::Archived,
            Transition::Restore => LogAction::Restored,
            Transition::Delete => LogAction::Deleted,
            Transition::Update => LogAction::Updated,
        }
    }

    /// "Archived department: Engineering (Also archived: 1 course(s), 1 faculty, 1 student(s))"
    pub fn summary(&self, kind: EntityKind, name: &str) -> String {
        let verb = self.transition.verb();
        let mut details = format!("{} {}: {}", self.action(), kind.noun(), name);

        if self.total() > 0 {
            let parts: Vec<String> = self
                .cascaded
                .iter()
                .map(|c| c.kind.count_label(c.count))
                .collect();
            details.push_str(&format!(" (Also {}: {})", verb, parts.join(", ")));
        }

        if self.is_partial() {
            let kinds: Vec<&str> = self.failures.iter().map(|f| f.kind.noun()).collect();
            details.push_str(&format!(" (Cascade incomplete: {})", kinds.join(", ")));
        }

        details
    }

    pub fn log_entry(&self, kind: EntityKind, name: &str) -> NewLogEntry {
        let status = if self.is_partial() {
            LogStatus::Warning
        } else {
            LogStatus::Success
        };
        NewLogEntry::new(self.action(), kind.label(), self.summary(kind, name)).with_status(status)
    }

    /// Human-readable warnings for the API response
    pub fn warnings(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|f| format!("{} cascade failed: {}", f.kind.noun(), f.error))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn department_report(transition: Transition, counts: [usize; 3]) -> CascadeReport {
        let mut report = CascadeReport::new(transition);
        report.push_count(EntityKind::Course, counts[0]);
        report.push_count(EntityKind::Faculty, counts[1]);
        report.push_count(EntityKind::Student, counts[2]);
        report
    }

    #[test]
    fn test_archive_summary() {
        let report = department_report(Transition::Archive, [1, 1, 1]);
        assert_eq!(
            report.summary(EntityKind::Department, "Engineering"),
            "Archived department: Engineering (Also archived: 1 course(s), 1 faculty, 1 student(s))"
        );
        assert_eq!(report.action(), LogAction::Archived);
    }

    #[test]
    fn test_zero_counts_drop_parenthetical() {
        let report = department_report(Transition::Archive, [0, 0, 0]);
        assert_eq!(
            report.summary(EntityKind::Department, "Engineering"),
            "Archived department: Engineering"
        );
    }

    #[test]
    fn test_partial_zero_counts_still_listed() {
        let report = department_report(Transition::Delete, [0, 2, 0]);
        assert_eq!(
            report.summary(EntityKind::Department, "Nursing"),
            "Deleted department: Nursing (Also deleted: 0 course(s), 2 faculty, 0 student(s))"
        );
    }

    #[test]
    fn test_plain_update_summary() {
        let report = CascadeReport::new(Transition::Update);
        assert_eq!(
            report.summary(EntityKind::AcademicYear, "2024-2025"),
            "Updated academic year: 2024-2025"
        );
    }

    #[test]
    fn test_failure_marks_warning() {
        let mut report = CascadeReport::new(Transition::Restore);
        report.push_count(EntityKind::Faculty, 0);
        report.push_count(EntityKind::Student, 3);
        report.push_failure(EntityKind::Course, "no such table: courses");

        let entry = report.log_entry(EntityKind::Department, "Engineering");
        assert_eq!(entry.status, LogStatus::Warning);
        assert_eq!(
            entry.details,
            "Restored department: Engineering (Also restored: 0 faculty, 3 student(s)) (Cascade incomplete: course)"
        );
        assert_eq!(report.warnings(), vec!["course cascade failed: no such table: courses"]);
    }
}
