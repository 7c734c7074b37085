//! Shared status vocabulary and event payloads.
//!
//! Each event type has a payload struct carrying the event-specific data.
//! [`DispatchEvent`] ties a payload to its event type and aggregate.

use chrono::{DateTime, Utc};
use hive_id::{AssignmentId, DroneId, JobId};
use serde::{Deserialize, Serialize};

use crate::{AggregateType, EventEnvelope, EventError};

// =============================================================================
// Event Type Constants
// =============================================================================

/// All event type names as constants.
pub mod event_types {
    // Assignment
    pub const ASSIGNMENT_CREATED: &str = "assignment.created";
    pub const ASSIGNMENT_STATUS_CHANGED: &str = "assignment.status_changed";

    // Drone
    pub const DRONE_STATUS_CHANGED: &str = "drone.status_changed";

    /// Every event type the engine emits.
    pub const ALL: [&str; 3] = [
        ASSIGNMENT_CREATED,
        ASSIGNMENT_STATUS_CHANGED,
        DRONE_STATUS_CHANGED,
    ];
}

/// Schema version stamped on every event the engine publishes.
pub const CURRENT_EVENT_VERSION: i32 = 1;

// =============================================================================
// Location
// =============================================================================

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns true if both coordinates are finite and within their ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lng)
    }
}

// =============================================================================
// Status Enums
// =============================================================================

/// Operational status of a drone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroneStatus {
    Available,
    Assigned,
    InFlight,
    Offline,
}

impl DroneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DroneStatus::Available => "available",
            DroneStatus::Assigned => "assigned",
            DroneStatus::InFlight => "in_flight",
            DroneStatus::Offline => "offline",
        }
    }
}

impl std::fmt::Display for DroneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DroneStatus {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(DroneStatus::Available),
            "assigned" => Ok(DroneStatus::Assigned),
            "in_flight" | "in-flight" => Ok(DroneStatus::InFlight),
            "offline" => Ok(DroneStatus::Offline),
            other => Err(EventError::UnknownStatus {
                kind: "drone",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle status of a job assignment.
///
/// Statuses only move forward: `assigned < in_progress < delivered`.
/// `failed` can be reached from any non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    InProgress,
    Delivered,
    Failed,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "assigned",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Delivered => "delivered",
            AssignmentStatus::Failed => "failed",
        }
    }

    /// Returns true once no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssignmentStatus::Delivered | AssignmentStatus::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            AssignmentStatus::Assigned => 0,
            AssignmentStatus::InProgress => 1,
            AssignmentStatus::Delivered | AssignmentStatus::Failed => 2,
        }
    }

    /// Returns true if moving from `self` to `next` is a forward transition.
    ///
    /// Re-applying the current status is not a transition and returns false.
    pub fn can_transition_to(&self, next: AssignmentStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            AssignmentStatus::Failed => true,
            _ => next.rank() > self.rank(),
        }
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssignmentStatus {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assigned" => Ok(AssignmentStatus::Assigned),
            "in_progress" | "in-progress" => Ok(AssignmentStatus::InProgress),
            "delivered" => Ok(AssignmentStatus::Delivered),
            "failed" => Ok(AssignmentStatus::Failed),
            other => Err(EventError::UnknownStatus {
                kind: "assignment",
                value: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// Event Payloads
// =============================================================================

// -----------------------------------------------------------------------------
// Assignment Events
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentCreatedPayload {
    pub assignment_id: AssignmentId,
    pub job_id: JobId,
    pub drone_id: DroneId,
    pub hive_score: f64,
    pub eta_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<f64>,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentStatusChangedPayload {
    pub assignment_id: AssignmentId,
    pub job_id: JobId,
    pub drone_id: DroneId,
    pub from: AssignmentStatus,
    pub to: AssignmentStatus,
    pub changed_at: DateTime<Utc>,
}

// -----------------------------------------------------------------------------
// Drone Events
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneStatusChangedPayload {
    pub drone_id: DroneId,
    pub from: DroneStatus,
    pub to: DroneStatus,
    pub location: GeoPoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
}

// =============================================================================
// Dispatch Event
// =============================================================================

/// Every event the dispatch engine publishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchEvent {
    AssignmentCreated(AssignmentCreatedPayload),
    AssignmentStatusChanged(AssignmentStatusChangedPayload),
    DroneStatusChanged(DroneStatusChangedPayload),
}

impl DispatchEvent {
    /// The dotted event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            DispatchEvent::AssignmentCreated(_) => event_types::ASSIGNMENT_CREATED,
            DispatchEvent::AssignmentStatusChanged(_) => event_types::ASSIGNMENT_STATUS_CHANGED,
            DispatchEvent::DroneStatusChanged(_) => event_types::DRONE_STATUS_CHANGED,
        }
    }

    /// The aggregate this event belongs to.
    pub fn aggregate_type(&self) -> AggregateType {
        match self {
            DispatchEvent::AssignmentCreated(_) | DispatchEvent::AssignmentStatusChanged(_) => {
                AggregateType::Job
            }
            DispatchEvent::DroneStatusChanged(_) => AggregateType::Drone,
        }
    }

    /// The ID of the aggregate instance.
    pub fn aggregate_id(&self) -> &str {
        match self {
            DispatchEvent::AssignmentCreated(p) => p.job_id.as_str(),
            DispatchEvent::AssignmentStatusChanged(p) => p.job_id.as_str(),
            DispatchEvent::DroneStatusChanged(p) => p.drone_id.as_str(),
        }
    }

    /// The job this event relates to, if any.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            DispatchEvent::AssignmentCreated(p) => Some(&p.job_id),
            DispatchEvent::AssignmentStatusChanged(p) => Some(&p.job_id),
            DispatchEvent::DroneStatusChanged(p) => p.job_id.as_ref(),
        }
    }
}

/// Envelope type delivered to subscribers.
pub type DispatchEnvelope = EventEnvelope<DispatchEvent>;

impl EventEnvelope<DispatchEvent> {
    /// Serializes the envelope for a push transport.
    pub fn to_json(&self) -> Result<String, EventError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses an envelope received from a transport, checking that the
    /// header agrees with the payload.
    pub fn from_json(json: &str) -> Result<Self, EventError> {
        let envelope: Self = serde_json::from_str(json)?;

        if !event_types::ALL.contains(&envelope.event_type.as_str()) {
            return Err(EventError::UnknownEventType(envelope.event_type));
        }
        if envelope.event_version != CURRENT_EVENT_VERSION {
            return Err(EventError::UnsupportedVersion {
                event_type: envelope.event_type,
                version: envelope.event_version,
            });
        }
        if envelope.event_type != envelope.payload.event_type() {
            return Err(EventError::HeaderMismatch {
                field: "event_type",
                header: envelope.event_type,
                payload: envelope.payload.event_type().to_string(),
            });
        }
        if envelope.aggregate_type != envelope.payload.aggregate_type() {
            return Err(EventError::HeaderMismatch {
                field: "aggregate_type",
                header: envelope.aggregate_type.to_string(),
                payload: envelope.payload.aggregate_type().to_string(),
            });
        }
        if envelope.aggregate_id != envelope.payload.aggregate_id() {
            return Err(EventError::HeaderMismatch {
                field: "aggregate_id",
                header: envelope.aggregate_id,
                payload: envelope.payload.aggregate_id().to_string(),
            });
        }

        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drone_status_serialization() {
        assert_eq!(
            serde_json::to_string(&DroneStatus::InFlight).unwrap(),
            "\"in_flight\""
        );
        assert_eq!("in-flight".parse::<DroneStatus>().unwrap(), DroneStatus::InFlight);
        assert!("parked".parse::<DroneStatus>().is_err());
    }

    #[test]
    fn test_assignment_forward_transitions() {
        use AssignmentStatus::*;

        assert!(Assigned.can_transition_to(InProgress));
        assert!(Assigned.can_transition_to(Delivered));
        assert!(InProgress.can_transition_to(Delivered));
        assert!(Assigned.can_transition_to(Failed));
        assert!(InProgress.can_transition_to(Failed));
    }

    #[test]
    fn test_assignment_backward_transitions_rejected() {
        use AssignmentStatus::*;

        assert!(!InProgress.can_transition_to(Assigned));
        assert!(!Delivered.can_transition_to(Assigned));
        assert!(!Delivered.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(InProgress));
        assert!(!Assigned.can_transition_to(Assigned));
    }

    #[test]
    fn test_geo_point_validity() {
        assert!(GeoPoint::new(28.7041, 77.1025).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -180.5).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_dispatch_event_routing() {
        let event = DispatchEvent::DroneStatusChanged(DroneStatusChangedPayload {
            drone_id: DroneId::parse("DRONE_001").unwrap(),
            from: DroneStatus::Available,
            to: DroneStatus::Assigned,
            location: GeoPoint::new(28.7041, 77.1025),
            job_id: Some(JobId::parse("job-1").unwrap()),
        });

        assert_eq!(event.event_type(), "drone.status_changed");
        assert_eq!(event.aggregate_type(), AggregateType::Drone);
        assert_eq!(event.aggregate_id(), "DRONE_001");
        assert_eq!(event.job_id().map(JobId::as_str), Some("job-1"));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "drone_status_changed");
        assert_eq!(json["to"], "assigned");
    }

    fn sample_envelope() -> DispatchEnvelope {
        let event = DispatchEvent::AssignmentStatusChanged(AssignmentStatusChangedPayload {
            assignment_id: AssignmentId::new(),
            job_id: JobId::parse("job-9").unwrap(),
            drone_id: DroneId::parse("DRONE_003").unwrap(),
            from: AssignmentStatus::Assigned,
            to: AssignmentStatus::InProgress,
            changed_at: Utc::now(),
        });
        EventEnvelope {
            event_id: hive_id::EventId::new(7),
            occurred_at: Utc::now(),
            aggregate_type: event.aggregate_type(),
            aggregate_id: event.aggregate_id().to_string(),
            aggregate_seq: hive_id::AggregateSeq::new(2),
            event_type: event.event_type().to_string(),
            event_version: CURRENT_EVENT_VERSION,
            actor_type: crate::ActorType::System,
            actor_id: "dispatcher".to_string(),
            correlation_id: Some("job-9".to_string()),
            payload: event,
        }
    }

    #[test]
    fn test_envelope_decode_accepts_consistent_header() {
        let envelope = sample_envelope();
        let decoded = DispatchEnvelope::from_json(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(decoded.event_id, envelope.event_id);
        assert_eq!(decoded.payload, envelope.payload);
    }

    #[test]
    fn test_envelope_decode_rejects_future_version() {
        let mut envelope = sample_envelope();
        envelope.event_version = 2;
        let err = DispatchEnvelope::from_json(&envelope.to_json().unwrap()).unwrap_err();
        assert!(matches!(err, EventError::UnsupportedVersion { version: 2, .. }));
    }

    #[test]
    fn test_envelope_decode_rejects_unknown_type() {
        let mut envelope = sample_envelope();
        envelope.event_type = "assignment.teleported".to_string();
        let err = DispatchEnvelope::from_json(&envelope.to_json().unwrap()).unwrap_err();
        assert!(matches!(err, EventError::UnknownEventType(_)));
    }

    #[test]
    fn test_envelope_decode_rejects_mismatched_aggregate() {
        let mut envelope = sample_envelope();
        envelope.aggregate_id = "job-10".to_string();
        let err = DispatchEnvelope::from_json(&envelope.to_json().unwrap()).unwrap_err();
        assert!(matches!(
            err,
            EventError::HeaderMismatch {
                field: "aggregate_id",
                ..
            }
        ));
    }

    #[test]
    fn test_envelope_decode_rejects_garbage() {
        let err = DispatchEnvelope::from_json("{not json").unwrap_err();
        assert!(matches!(err, EventError::Decode(_)));
    }
}
