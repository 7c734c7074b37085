//! Typed ID definitions for dispatch resources.
//!
//! Fleet members and jobs are named by the caller. Records created by the
//! engine itself carry ULID-based IDs with a unique prefix.

use crate::{define_id, define_name_id};

// =============================================================================
// Caller-named Resources
// =============================================================================

define_name_id!(DroneId, "drone");
define_name_id!(JobId, "job");

// =============================================================================
// Engine-generated Records
// =============================================================================

define_id!(AssignmentId, "asgn");
define_id!(SubscriptionId, "sub");

// =============================================================================
// Event Ordering
// =============================================================================

/// Position of an event in the bus-wide publish order.
///
/// Assigned by the notification bus, starting at 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct EventId(i64);

impl EventId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Position of an event among the events of one job or one drone.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct AggregateSeq(i32);

impl AggregateSeq {
    pub const FIRST: Self = Self(1);

    #[must_use]
    pub const fn new(seq: i32) -> Self {
        Self(seq)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }

    /// The following sequence number, saturating at `i32::MAX`.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl Default for AggregateSeq {
    fn default() -> Self {
        Self::FIRST
    }
}

impl std::fmt::Display for AggregateSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Tests
// =============================================================================
