//! Header fields shared by every dispatch event.

use chrono::{DateTime, Utc};
use hive_id::{AggregateSeq, EventId};
use serde::{Deserialize, Serialize};

/// Who caused an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    /// A human operator acting through the API layer.
    Operator,
    /// The engine itself (allocation, lifecycle coordination).
    #[default]
    System,
}

impl ActorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorType::Operator => "operator",
            ActorType::System => "system",
        }
    }
}

impl std::fmt::Display for ActorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of record an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateType {
    Job,
    Drone,
}

impl AggregateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateType::Job => "job",
            AggregateType::Drone => "drone",
        }
    }
}

impl std::fmt::Display for AggregateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata wrapped around a payload `P` at publish time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<P> {
    /// Monotonic identifier assigned by the publisher.
    pub event_id: EventId,

    /// When the event was published.
    pub occurred_at: DateTime<Utc>,

    pub aggregate_type: AggregateType,

    /// Job ID or drone ID.
    pub aggregate_id: String,

    /// Starts at 1 for each aggregate and never skips.
    pub aggregate_seq: AggregateSeq,

    /// Dotted name such as `assignment.created`.
    pub event_type: String,

    pub event_version: i32,

    pub actor_type: ActorType,

    /// `hive-dispatch` for engine events, the operator name otherwise.
    pub actor_id: String,

    /// Grouping ID for related events, usually the job ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    pub payload: P,
}
