// Mutation entry points: create, update (archive / restore / plain), delete.
//
// Parent write and dependent writes share one SQLite transaction. Each
// dependent kind runs in its own savepoint, so one failing kind is rolled
// back alone and reported instead of undoing the parent.

use chrono::Utc;
use rusqlite::{Connection, Transaction};
use serde::Serialize;

use super::relations::dependents_of;
use super::report::CascadeReport;
use crate::activity_log::{self, LogAction, LogEntry, LogStatus, NewLogEntry, DEFAULT_USER};
use crate::entities::{EntityKind, Record};
use crate::error::{RecordsError, Result};
use crate::lifecycle::{self, LifecyclePatch, Transition};
use crate::store;

/// Result of a create or update
#[derive(Debug, Clone, Serialize)]
pub struct MutationOutcome<R> {
    pub record: R,
    pub report: CascadeReport,
    /// `None` when the log write failed (the mutation still stands)
    pub log: Option<LogEntry>,
}

impl<R> MutationOutcome<R> {
    pub fn warnings(&self) -> Vec<String> {
        self.report.warnings()
    }
}

/// Result of a permanent delete
#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub kind: EntityKind,
    pub id: String,
    pub name: String,
    pub report: CascadeReport,
    pub log: Option<LogEntry>,
}

impl DeleteOutcome {
    pub fn message(&self) -> String {
        format!("{} deleted successfully", self.kind.label())
    }
}

// ============================================================================
// ENGINE
// ============================================================================

#[derive(Debug, Clone)]
pub struct CascadeEngine {
    actor: String,
}

impl Default for CascadeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CascadeEngine {
    pub fn new() -> Self {
        CascadeEngine {
            actor: DEFAULT_USER.to_string(),
        }
    }

    /// Engine that writes log entries under another user name
    pub fn with_actor(actor: &str) -> Self {
        CascadeEngine {
            actor: actor.to_string(),
        }
    }

    /// Validate and insert a record, logging `Created`
    pub fn create<R: Record>(&self, conn: &mut Connection, new: R::New) -> Result<MutationOutcome<R>> {
        match store::create::<R>(conn, new) {
            Ok(record) => {
                let entry = NewLogEntry::new(
                    LogAction::Created,
                    R::KIND.label(),
                    format!("Created {}: {}", R::KIND.noun(), record.name()),
                );
                let log = self.log(conn, entry);
                tracing::info!(kind = R::KIND.label(), id = %record.id(), "record created");

                Ok(MutationOutcome {
                    record,
                    report: CascadeReport::new(Transition::Update),
                    log,
                })
            }
            Err(e) => {
                self.log_failure(conn, R::KIND, "create", None, &e);
                Err(e)
            }
        }
    }

    /// Apply a patch, cascading when it archives or restores the record
    pub fn update<R: Record>(
        &self,
        conn: &mut Connection,
        id: &str,
        patch: R::Patch,
    ) -> Result<MutationOutcome<R>> {
        match self.try_update::<R>(conn, id, patch) {
            Ok((record, report)) => {
                let log = self.log(conn, report.log_entry(R::KIND, record.name()));
                Ok(MutationOutcome { record, report, log })
            }
            Err(e) => {
                self.log_failure(conn, R::KIND, "update", Some(id), &e);
                Err(e)
            }
        }
    }

    /// Permanently delete a record and every dependent naming it
    pub fn delete<R: Record>(&self, conn: &mut Connection, id: &str) -> Result<DeleteOutcome> {
        match self.try_delete::<R>(conn, id) {
            Ok((name, report)) => {
                let log = self.log(conn, report.log_entry(R::KIND, &name));
                Ok(DeleteOutcome {
                    kind: R::KIND,
                    id: id.to_string(),
                    name,
                    report,
                    log,
                })
            }
            Err(e) => {
                self.log_failure(conn, R::KIND, "delete", Some(id), &e);
                Err(e)
            }
        }
    }

    fn try_update<R: Record>(
        &self,
        conn: &mut Connection,
        id: &str,
        patch: R::Patch,
    ) -> Result<(R, CascadeReport)> {
        let mut tx = conn.transaction()?;

        let current: R = store::get(&tx, id)?;
        let previous = current.lifecycle();
        let signal = patch.signal();

        let transition = lifecycle::detect_transition(R::KIND, &previous, &signal)
            .map_err(|e| RecordsError::from_field_errors(vec![e]))?;

        let next_lifecycle = match transition.target() {
            Some(state) => lifecycle::transition_lifecycle(R::KIND, state, &signal),
            None => lifecycle::merge_plain_update(R::KIND, &previous, &signal)
                .map_err(|e| RecordsError::from_field_errors(vec![e]))?,
        };

        let updated = store::apply_patch(&tx, &current, patch, &next_lifecycle)?;

        let mut report = CascadeReport::new(transition);
        if let Some(state) = transition.target() {
            let now = Utc::now();
            for relation in dependents_of(R::KIND) {
                let result = match relation.key() {
                    Some(key) => in_savepoint(&mut tx, |sp| {
                        store::bulk_set_lifecycle(sp, key, updated.name(), state, now)
                    }),
                    None => Err(RecordsError::invalid(
                        relation.field.column(),
                        "is not a relation column",
                    )),
                };
                self.tally(&mut report, relation.child, result);
            }
        }

        tx.commit()?;

        tracing::info!(
            kind = R::KIND.label(),
            id = %id,
            transition = ?transition,
            cascaded = report.total(),
            "record updated"
        );
        Ok((updated, report))
    }

    fn try_delete<R: Record>(&self, conn: &mut Connection, id: &str) -> Result<(String, CascadeReport)> {
        let mut tx = conn.transaction()?;

        let current: R = store::get(&tx, id)?;
        let name = current.name().to_string();

        let mut report = CascadeReport::new(Transition::Delete);
        for relation in dependents_of(R::KIND) {
            let result = match relation.key() {
                Some(key) => in_savepoint(&mut tx, |sp| store::bulk_delete(sp, key, &name)),
                None => Err(RecordsError::invalid(
                    relation.field.column(),
                    "is not a relation column",
                )),
            };
            self.tally(&mut report, relation.child, result);
        }

        store::delete::<R>(&tx, id)?;
        tx.commit()?;

        tracing::info!(
            kind = R::KIND.label(),
            id = %id,
            cascaded = report.total(),
            "record deleted"
        );
        Ok((name, report))
    }

    fn tally(&self, report: &mut CascadeReport, child: EntityKind, result: Result<usize>) {
        match result {
            Ok(count) => report.push_count(child, count),
            Err(e) => {
                tracing::warn!(child = child.label(), error = %e, "cascade step failed");
                report.push_failure(child, e);
            }
        }
    }

    fn log(&self, conn: &Connection, entry: NewLogEntry) -> Option<LogEntry> {
        activity_log::record_best_effort(conn, &entry.by(&self.actor))
    }

    /// Internal failures leave an `Error` entry; client errors leave nothing
    fn log_failure(
        &self,
        conn: &Connection,
        kind: EntityKind,
        operation: &str,
        id: Option<&str>,
        error: &RecordsError,
    ) {
        if !error.is_internal() {
            return;
        }
        tracing::error!(kind = kind.label(), operation, error = %error, "mutation failed");

        let target = match id {
            Some(id) => format!("{} {}", kind.noun(), id),
            None => kind.noun().to_string(),
        };
        let entry = NewLogEntry::new(
            LogAction::Error,
            kind.label(),
            format!("Failed to {} {}: {}", operation, target, error),
        )
        .with_status(LogStatus::Error);
        self.log(conn, entry);
    }
}

/// Run `op` inside a savepoint; an error rolls back only this step
fn in_savepoint<T>(
    tx: &mut Transaction<'_>,
    op: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    let sp = tx.savepoint()?;
    let value = op(&sp)?;
    sp.commit()?;
    Ok(value)
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
