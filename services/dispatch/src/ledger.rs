//! Job ledger.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use hive_events::AssignmentStatus;
use hive_id::JobId;

use crate::error::LedgerError;
use crate::model::Assignment;

/// Result of a lifecycle transition.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// The status moved; `assignment` is the updated record.
    Changed {
        from: AssignmentStatus,
        assignment: Assignment,
    },
    /// The job was already in the requested status.
    Unchanged(Assignment),
}

impl TransitionOutcome {
    pub fn assignment(&self) -> &Assignment {
        match self {
            TransitionOutcome::Changed { assignment, .. } => assignment,
            TransitionOutcome::Unchanged(assignment) => assignment,
        }
    }
}

/// One assignment per job, keyed by job id.
///
/// Entries are sharded, so records and transitions on different jobs do
/// not contend.
#[derive(Debug, Default)]
pub struct JobLedger {
    entries: DashMap<JobId, Assignment>,
}

impl JobLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new assignment. A second record for the same job fails.
    pub fn record(&self, assignment: Assignment) -> Result<(), LedgerError> {
        match self.entries.entry(assignment.job_id.clone()) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateJob(assignment.job_id)),
            Entry::Vacant(slot) => {
                slot.insert(assignment);
                Ok(())
            }
        }
    }

    /// Moves a job to `next` if the lifecycle allows it.
    pub fn transition(
        &self,
        job_id: &str,
        next: AssignmentStatus,
    ) -> Result<TransitionOutcome, LedgerError> {
        let mut entry = self
            .entries
            .get_mut(job_id)
            .ok_or_else(|| LedgerError::UnknownJob(job_id.to_string()))?;

        let current = entry.status;
        if current == next {
            return Ok(TransitionOutcome::Unchanged(entry.clone()));
        }
        if !current.can_transition_to(next) {
            return Err(LedgerError::InvalidTransition {
                job_id: entry.job_id.clone(),
                from: current,
                to: next,
            });
        }

        entry.status = next;
        entry.status_changed_at = Utc::now();
        Ok(TransitionOutcome::Changed {
            from: current,
            assignment: entry.clone(),
        })
    }

    pub fn get(&self, job_id: &str) -> Option<Assignment> {
        self.entries.get(job_id).map(|e| e.value().clone())
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.entries.contains_key(job_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of jobs not yet delivered or failed.
    pub fn active_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.status.is_terminal())
            .count()
    }
}
