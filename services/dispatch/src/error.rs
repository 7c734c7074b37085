//! Error types for the dispatch engine.

use hive_events::AssignmentStatus;
use hive_id::{DroneId, JobId};
use thiserror::Error;

/// Result type for allocation.
pub type DispatchResult<T> = Result<T, AllocationError>;

/// Errors raised while building the fleet.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FleetError {
    #[error("duplicate drone id: {0}")]
    DuplicateDrone(DroneId),

    #[error("invalid drone {drone_id}: {reason}")]
    InvalidDrone { drone_id: DroneId, reason: String },
}

/// Errors raised by the job ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("job {0} already has an assignment")]
    DuplicateJob(JobId),

    #[error("unknown job: {0}")]
    UnknownJob(String),

    #[error("job {job_id} cannot move from {from} to {to}")]
    InvalidTransition {
        job_id: JobId,
        from: AssignmentStatus,
        to: AssignmentStatus,
    },
}

impl LedgerError {
    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::DuplicateJob(_) => "duplicate_job",
            LedgerError::UnknownJob(_) => "unknown_job",
            LedgerError::InvalidTransition { .. } => "invalid_transition",
        }
    }
}

/// Errors returned by [`crate::Dispatcher::allocate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// No fleet member was available when the request was evaluated.
    #[error("no drones available")]
    NoDronesAvailable,

    /// Every attempt lost its claim to a concurrent allocation.
    #[error("allocation lost the race for a drone {attempts} times")]
    AllocationRaceExhausted { attempts: usize },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl AllocationError {
    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AllocationError::NoDronesAvailable => "no_drones_available",
            AllocationError::AllocationRaceExhausted { .. } => "allocation_race_exhausted",
            AllocationError::Ledger(e) => e.kind(),
        }
    }

    /// Returns true if resubmitting the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AllocationError::NoDronesAvailable | AllocationError::AllocationRaceExhausted { .. }
        )
    }
}
