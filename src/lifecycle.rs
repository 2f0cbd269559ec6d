// 🔁 Lifecycle - archived flag + status string as one state
//
// Course and Department carry two lifecycle fields (`archived` and `status`)
// that every write path keeps in agreement. Internally they are one
// `LifecycleState`; the vocabulary maps it back to each kind's status words.

use serde::{Deserialize, Serialize};

use crate::entities::EntityKind;
use crate::error::FieldError;

// ============================================================================
// LIFECYCLE STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Active,
    Archived,
}

impl LifecycleState {
    pub fn from_archived(archived: bool) -> Self {
        if archived {
            LifecycleState::Archived
        } else {
            LifecycleState::Active
        }
    }

    pub fn is_archived(&self) -> bool {
        matches!(self, LifecycleState::Archived)
    }
}

// ============================================================================
// STATUS VOCABULARY
// ============================================================================

/// Status words a kind accepts.
///
/// `others` are statuses that are neither archived nor the restore target
/// (Department's "Deactivated"). They count as not archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusVocabulary {
    pub active: &'static str,
    pub archived: &'static str,
    pub others: &'static [&'static str],
}

pub const COURSE_STATUSES: StatusVocabulary = StatusVocabulary {
    active: "active",
    archived: "archived",
    others: &[],
};

pub const DEPARTMENT_STATUSES: StatusVocabulary = StatusVocabulary {
    active: "Active",
    archived: "Archived",
    others: &["Deactivated"],
};

impl StatusVocabulary {
    /// Canonical spelling of a status, matched case-insensitively.
    pub fn parse(&self, raw: &str) -> Option<&'static str> {
        let raw = raw.trim();
        std::iter::once(self.active)
            .chain(std::iter::once(self.archived))
            .chain(self.others.iter().copied())
            .find(|candidate| candidate.eq_ignore_ascii_case(raw))
    }

    pub fn is_archived(&self, status: &str) -> bool {
        self.archived.eq_ignore_ascii_case(status.trim())
    }

    pub fn is_active(&self, status: &str) -> bool {
        self.active.eq_ignore_ascii_case(status.trim())
    }

    pub fn status_for(&self, state: LifecycleState) -> &'static str {
        match state {
            LifecycleState::Active => self.active,
            LifecycleState::Archived => self.archived,
        }
    }

    fn allowed(&self) -> String {
        let mut words = vec![self.active, self.archived];
        words.extend(self.others.iter().copied());
        words.join(", ")
    }
}

// ============================================================================
// LIFECYCLE FIELDS + SIGNALS
// ============================================================================

/// The stored lifecycle pair of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifecycle {
    pub archived: bool,
    /// `None` for kinds without a status column.
    pub status: Option<String>,
}

impl Lifecycle {
    pub fn plain(archived: bool) -> Self {
        Lifecycle {
            archived,
            status: None,
        }
    }

    pub fn with_status(archived: bool, status: &str) -> Self {
        Lifecycle {
            archived,
            status: Some(status.to_string()),
        }
    }

    /// Lifecycle pair for a state, with the status word when the kind has one.
    pub fn for_state(kind: EntityKind, state: LifecycleState) -> Self {
        Lifecycle {
            archived: state.is_archived(),
            status: kind
                .status_vocabulary()
                .map(|vocab| vocab.status_for(state).to_string()),
        }
    }
}

/// The lifecycle fields present in an incoming patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleSignal {
    pub archived: Option<bool>,
    pub status: Option<String>,
}

/// Implemented by patch bodies so the engine can read the trigger fields.
pub trait LifecyclePatch {
    fn signal(&self) -> LifecycleSignal;
}

// ============================================================================
// TRANSITIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Transition {
    Archive,
    Restore,
    Delete,
    Update,
}

impl Transition {
    /// Lifecycle state the transition drives root and dependents to.
    pub fn target(&self) -> Option<LifecycleState> {
        match self {
            Transition::Archive => Some(LifecycleState::Archived),
            Transition::Restore => Some(LifecycleState::Active),
            Transition::Delete | Transition::Update => None,
        }
    }

    /// Past-tense verb used in log details.
    pub fn verb(&self) -> &'static str {
        match self {
            Transition::Archive => "archived",
            Transition::Restore => "restored",
            Transition::Delete => "deleted",
            Transition::Update => "updated",
        }
    }
}

/// Classify a patch against the record's previous lifecycle.
///
/// Archive is checked before restore, so a patch carrying
/// `archived: true, status: "active"` archives.
pub fn detect_transition(
    kind: EntityKind,
    previous: &Lifecycle,
    signal: &LifecycleSignal,
) -> Result<Transition, FieldError> {
    let vocab = kind.status_vocabulary();

    let incoming_status = match (vocab, signal.status.as_deref()) {
        (Some(vocab), Some(raw)) => Some(parse_status(&vocab, raw)?),
        _ => None,
    };

    let previous_status_archived = match (vocab, previous.status.as_deref()) {
        (Some(vocab), Some(status)) => vocab.is_archived(status),
        _ => previous.archived,
    };

    let archive_by_flag = signal.archived == Some(true) && !previous.archived;
    let archive_by_status = match (vocab, incoming_status) {
        (Some(vocab), Some(status)) => vocab.is_archived(status) && !previous_status_archived,
        _ => false,
    };
    if archive_by_flag || archive_by_status {
        return Ok(Transition::Archive);
    }

    let restore_by_flag = signal.archived == Some(false) && previous.archived;
    let restore_by_status = match (vocab, incoming_status) {
        (Some(vocab), Some(status)) => vocab.is_active(status) && previous_status_archived,
        _ => false,
    };
    if restore_by_flag || restore_by_status {
        return Ok(Transition::Restore);
    }

    Ok(Transition::Update)
}

/// Lifecycle pair the root record lands on after an archive or restore.
///
/// A restore keeps a non-archived status word the patch names, so
/// `archived: false, status: "Deactivated"` brings a department back as
/// Deactivated. Dependents always take the kind's active word.
pub fn transition_lifecycle(
    kind: EntityKind,
    state: LifecycleState,
    signal: &LifecycleSignal,
) -> Lifecycle {
    let mut lifecycle = Lifecycle::for_state(kind, state);
    if state.is_archived() {
        return lifecycle;
    }

    let requested = match (kind.status_vocabulary(), signal.status.as_deref()) {
        (Some(vocab), Some(raw)) => vocab.parse(raw).filter(|word| !vocab.is_archived(word)),
        _ => None,
    };
    if let Some(word) = requested {
        lifecycle.status = Some(word.to_string());
    }
    lifecycle
}

/// Merge a plain-update signal into the previous pair and check it stays coherent.
pub fn merge_plain_update(
    kind: EntityKind,
    previous: &Lifecycle,
    signal: &LifecycleSignal,
) -> Result<Lifecycle, FieldError> {
    let merged = Lifecycle {
        archived: signal.archived.unwrap_or(previous.archived),
        status: match (&signal.status, &previous.status) {
            (Some(incoming), _) if kind.status_vocabulary().is_some() => Some(incoming.clone()),
            (_, prev) => prev.clone(),
        },
    };
    normalize(kind, &merged)
}

/// Canonicalize the status word and reject a pair that disagrees with itself.
pub fn normalize(kind: EntityKind, lifecycle: &Lifecycle) -> Result<Lifecycle, FieldError> {
    let Some(vocab) = kind.status_vocabulary() else {
        return Ok(Lifecycle::plain(lifecycle.archived));
    };

    let status = match lifecycle.status.as_deref() {
        Some(raw) => parse_status(&vocab, raw)?,
        None => vocab.status_for(LifecycleState::from_archived(lifecycle.archived)),
    };

    if vocab.is_archived(status) != lifecycle.archived {
        return Err(FieldError::new(
            "status",
            format!(
                "status '{}' conflicts with archived={}",
                status, lifecycle.archived
            ),
        ));
    }

    Ok(Lifecycle::with_status(lifecycle.archived, status))
}

fn parse_status(vocab: &StatusVocabulary, raw: &str) -> Result<&'static str, FieldError> {
    vocab.parse(raw).ok_or_else(|| {
        FieldError::new(
            "status",
            format!("must be one of: {}", vocab.allowed()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(archived: Option<bool>, status: Option<&str>) -> LifecycleSignal {
        LifecycleSignal {
            archived,
            status: status.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_student_archive_and_restore_by_flag() {
        let active = Lifecycle::plain(false);
        let archived = Lifecycle::plain(true);

        assert_eq!(
            detect_transition(EntityKind::Student, &active, &signal(Some(true), None)),
            Ok(Transition::Archive)
        );
        assert_eq!(
            detect_transition(EntityKind::Student, &archived, &signal(Some(false), None)),
            Ok(Transition::Restore)
        );
    }

    #[test]
    fn test_repeated_archive_is_plain_update() {
        let archived = Lifecycle::plain(true);
        assert_eq!(
            detect_transition(EntityKind::Faculty, &archived, &signal(Some(true), None)),
            Ok(Transition::Update)
        );

        let dept = Lifecycle::with_status(true, "Archived");
        assert_eq!(
            detect_transition(
                EntityKind::Department,
                &dept,
                &signal(Some(true), Some("Archived"))
            ),
            Ok(Transition::Update)
        );
    }

    #[test]
    fn test_status_alone_triggers_archive() {
        let course = Lifecycle::with_status(false, "active");
        assert_eq!(
            detect_transition(EntityKind::Course, &course, &signal(None, Some("archived"))),
            Ok(Transition::Archive)
        );

        let dept = Lifecycle::with_status(false, "Active");
        assert_eq!(
            detect_transition(EntityKind::Department, &dept, &signal(None, Some("archived"))),
            Ok(Transition::Archive)
        );
    }

    #[test]
    fn test_status_alone_triggers_restore() {
        let dept = Lifecycle::with_status(true, "Archived");
        assert_eq!(
            detect_transition(EntityKind::Department, &dept, &signal(None, Some("Active"))),
            Ok(Transition::Restore)
        );
    }

    #[test]
    fn test_deactivated_is_not_a_restore() {
        let dept = Lifecycle::with_status(true, "Archived");
        assert_eq!(
            detect_transition(
                EntityKind::Department,
                &dept,
                &signal(None, Some("Deactivated"))
            ),
            Ok(Transition::Update)
        );
    }

    #[test]
    fn test_archive_wins_over_restore() {
        let course = Lifecycle::with_status(false, "active");
        assert_eq!(
            detect_transition(
                EntityKind::Course,
                &course,
                &signal(Some(true), Some("active"))
            ),
            Ok(Transition::Archive)
        );
    }

    #[test]
    fn test_status_ignored_for_kinds_without_status() {
        let student = Lifecycle::plain(false);
        assert_eq!(
            detect_transition(EntityKind::Student, &student, &signal(None, Some("archived"))),
            Ok(Transition::Update)
        );
    }

    #[test]
    fn test_unknown_status_rejected() {
        let course = Lifecycle::with_status(false, "active");
        let err = detect_transition(EntityKind::Course, &course, &signal(None, Some("paused")))
            .unwrap_err();
        assert_eq!(err.field, "status");
    }

    #[test]
    fn test_normalize_canonicalizes_and_checks_pair() {
        let normalized =
            normalize(EntityKind::Department, &Lifecycle::with_status(false, "deactivated"))
                .unwrap();
        assert_eq!(normalized.status.as_deref(), Some("Deactivated"));

        let defaulted = normalize(EntityKind::Course, &Lifecycle::plain(false)).unwrap();
        assert_eq!(defaulted.status.as_deref(), Some("active"));

        assert!(normalize(EntityKind::Course, &Lifecycle::with_status(false, "archived")).is_err());
        assert!(
            normalize(EntityKind::Department, &Lifecycle::with_status(true, "Deactivated"))
                .is_err()
        );
    }

    #[test]
    fn test_merge_plain_update_keeps_previous_status() {
        let previous = Lifecycle::with_status(false, "Active");
        let merged =
            merge_plain_update(EntityKind::Department, &previous, &LifecycleSignal::default())
                .unwrap();
        assert_eq!(merged, previous);

        let deactivated = merge_plain_update(
            EntityKind::Department,
            &previous,
            &signal(None, Some("Deactivated")),
        )
        .unwrap();
        assert_eq!(deactivated.status.as_deref(), Some("Deactivated"));
        assert!(!deactivated.archived);
    }

    #[test]
    fn test_restore_keeps_requested_non_archived_word() {
        let archived = Lifecycle::with_status(true, "Archived");
        let deactivate = signal(Some(false), Some("deactivated"));

        assert_eq!(
            detect_transition(EntityKind::Department, &archived, &deactivate),
            Ok(Transition::Restore)
        );
        assert_eq!(
            transition_lifecycle(EntityKind::Department, LifecycleState::Active, &deactivate),
            Lifecycle::with_status(false, "Deactivated")
        );
        assert_eq!(
            transition_lifecycle(
                EntityKind::Department,
                LifecycleState::Active,
                &signal(Some(false), None)
            ),
            Lifecycle::with_status(false, "Active")
        );
    }

    #[test]
    fn test_archive_ignores_requested_word() {
        assert_eq!(
            transition_lifecycle(
                EntityKind::Course,
                LifecycleState::Archived,
                &signal(Some(true), Some("active"))
            ),
            Lifecycle::with_status(true, "archived")
        );
        assert_eq!(
            transition_lifecycle(
                EntityKind::Student,
                LifecycleState::Active,
                &signal(Some(false), Some("Deactivated"))
            ),
            Lifecycle::plain(false)
        );
    }

    #[test]
    fn test_for_state_fills_status_word() {
        assert_eq!(
            Lifecycle::for_state(EntityKind::Department, LifecycleState::Archived),
            Lifecycle::with_status(true, "Archived")
        );
        assert_eq!(
            Lifecycle::for_state(EntityKind::Course, LifecycleState::Active),
            Lifecycle::with_status(false, "active")
        );
        assert_eq!(
            Lifecycle::for_state(EntityKind::Student, LifecycleState::Archived),
            Lifecycle::plain(true)
        );
    }
}
