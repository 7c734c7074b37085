//! Notification bus.
//!
//! Fan-out publisher for dispatch events. Every subscriber gets its own
//! bounded queue; publishing never waits on a subscriber. When a queue is
//! full the event is dropped for that subscriber only and counted.
//!
//! The bus stamps each envelope with a global event id and a sequence
//! number scoped to the event's aggregate (one job or one drone), so a
//! consumer can detect gaps left by dropped events.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use chrono::Utc;
use futures_core::Stream;
use hive_events::{
    ActorType, AggregateType, DispatchEnvelope, DispatchEvent, EventEnvelope,
    CURRENT_EVENT_VERSION,
};
use hive_id::{AggregateSeq, EventId, SubscriptionId};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::DEFAULT_SUBSCRIBER_BUFFER;

/// Actor id used for events the engine publishes on its own behalf.
pub const SYSTEM_ACTOR: &str = "hive-dispatch";

struct BusState {
    next_event_id: i64,
    sequences: HashMap<(AggregateType, String), AggregateSeq>,
    subscribers: Vec<(SubscriptionId, mpsc::Sender<Arc<DispatchEnvelope>>)>,
    dropped: u64,
}

/// Publish/subscribe hub for [`DispatchEvent`]s.
pub struct NotificationBus {
    buffer: usize,
    state: Mutex<BusState>,
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("NotificationBus")
            .field("buffer", &self.buffer)
            .field("subscribers", &state.subscribers.len())
            .field("dropped", &state.dropped)
            .finish()
    }
}

impl NotificationBus {
    /// Creates a bus whose subscribers each queue up to `buffer` events.
    pub fn new(buffer: usize) -> Self {
        Self {
            buffer: buffer.max(1),
            state: Mutex::new(BusState {
                next_event_id: 1,
                sequences: HashMap::new(),
                subscribers: Vec::new(),
                dropped: 0,
            }),
        }
    }

    /// Publishes an event on behalf of the engine.
    pub fn publish(&self, event: DispatchEvent) -> EventId {
        self.publish_as(ActorType::System, SYSTEM_ACTOR, event)
    }

    /// Publishes an event attributed to `actor_id`.
    pub fn publish_as(
        &self,
        actor_type: ActorType,
        actor_id: impl Into<String>,
        event: DispatchEvent,
    ) -> EventId {
        let mut state = self.state.lock();

        let event_id = EventId::new(state.next_event_id);
        state.next_event_id += 1;

        let aggregate_type = event.aggregate_type();
        let aggregate_id = event.aggregate_id().to_string();
        let aggregate_seq = *state
            .sequences
            .entry((aggregate_type, aggregate_id.clone()))
            .and_modify(|seq| *seq = seq.next())
            .or_insert(AggregateSeq::FIRST);
        if let DispatchEvent::AssignmentStatusChanged(p) = &event {
            if p.to.is_terminal() {
                // Job ids are never reused, so a finished job publishes nothing more.
                state.sequences.remove(&(aggregate_type, aggregate_id.clone()));
            }
        }

        let envelope = Arc::new(EventEnvelope {
            event_id,
            occurred_at: Utc::now(),
            aggregate_type,
            aggregate_id,
            aggregate_seq,
            event_type: event.event_type().to_string(),
            event_version: CURRENT_EVENT_VERSION,
            actor_type,
            actor_id: actor_id.into(),
            correlation_id: event.job_id().map(|id| id.to_string()),
            payload: event,
        });

        // Delivery happens under the lock so every subscriber sees events in
        // publish order. try_send never waits.
        let mut dropped = 0;
        state.subscribers.retain(|(id, tx)| match tx.try_send(envelope.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(
                    subscription_id = %id,
                    event_id = %event_id,
                    event_type = %envelope.event_type,
                    "Subscriber queue full, dropping event"
                );
                dropped += 1;
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(subscription_id = %id, "Subscriber gone, removing");
                false
            }
        });
        state.dropped += dropped;

        debug!(
            event_id = %event_id,
            event_type = %envelope.event_type,
            aggregate_id = %envelope.aggregate_id,
            aggregate_seq = %aggregate_seq,
            "Event published"
        );

        event_id
    }

    /// Registers a new subscriber. Only events published after this call
    /// are delivered.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = SubscriptionId::new();
        self.state.lock().subscribers.push((id, tx));
        debug!(subscription_id = %id, "Subscriber added");
        Subscription { id, rx }
    }

    /// Removes a subscriber. Its stream ends once queued events are drained.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.state.lock();
        let before = state.subscribers.len();
        state.subscribers.retain(|(sid, _)| *sid != id);
        before != state.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// Total events dropped across all subscribers.
    pub fn dropped_count(&self) -> u64 {
        self.state.lock().dropped
    }
}

/// Receiving end of one subscription.
///
/// Dropping it unsubscribes lazily; the bus prunes the sender on its next
/// publish.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    rx: mpsc::Receiver<Arc<DispatchEnvelope>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next event. `None` after unsubscribe once the queue is
    /// drained.
    pub async fn recv(&mut self) -> Option<Arc<DispatchEnvelope>> {
        self.rx.recv().await
    }

    /// Returns a queued event without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<DispatchEnvelope>> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = Arc<DispatchEnvelope>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_events::{
        AssignmentStatus, AssignmentStatusChangedPayload, DroneStatus, DroneStatusChangedPayload,
        GeoPoint,
    };
    use hive_id::{AssignmentId, DroneId, JobId};

    fn drone_event(drone: &str, to: DroneStatus) -> DispatchEvent {
        DispatchEvent::DroneStatusChanged(DroneStatusChangedPayload {
            drone_id: DroneId::parse(drone).unwrap(),
            from: DroneStatus::Available,
            to,
            location: GeoPoint::new(28.7041, 77.1025),
            job_id: None,
        })
    }

    #[test]
    fn test_event_ids_and_sequences() {
        let bus = NotificationBus::new(8);
        let mut sub = bus.subscribe();

        bus.publish(drone_event("DRONE_001", DroneStatus::Assigned));
        bus.publish(drone_event("DRONE_002", DroneStatus::Assigned));
        bus.publish(drone_event("DRONE_001", DroneStatus::InFlight));

        let seen: Vec<_> = std::iter::from_fn(|| sub.try_recv())
            .map(|e| (e.event_id.value(), e.aggregate_id.clone(), e.aggregate_seq.value()))
            .collect();
        assert_eq!(
            seen,
            [
                (1, "DRONE_001".to_string(), 1),
                (2, "DRONE_002".to_string(), 1),
                (3, "DRONE_001".to_string(), 2),
            ]
        );
    }

    fn job_status_event(job: &str, to: AssignmentStatus) -> DispatchEvent {
        DispatchEvent::AssignmentStatusChanged(AssignmentStatusChangedPayload {
            assignment_id: AssignmentId::new(),
            job_id: JobId::parse(job).unwrap(),
            drone_id: DroneId::parse("DRONE_001").unwrap(),
            from: AssignmentStatus::Assigned,
            to,
            changed_at: Utc::now(),
        })
    }

    #[test]
    fn test_finished_job_sequence_is_forgotten() {
        let bus = NotificationBus::new(8);
        let mut sub = bus.subscribe();

        bus.publish(job_status_event("job-1", AssignmentStatus::InProgress));
        bus.publish(job_status_event("job-2", AssignmentStatus::InProgress));
        assert_eq!(bus.state.lock().sequences.len(), 2);

        bus.publish(job_status_event("job-1", AssignmentStatus::Delivered));
        bus.publish(job_status_event("job-2", AssignmentStatus::Failed));
        assert!(bus.state.lock().sequences.is_empty());

        // The terminal event still carries the job's running sequence.
        let seqs: Vec<i32> = std::iter::from_fn(|| sub.try_recv())
            .map(|e| e.aggregate_seq.value())
            .collect();
        assert_eq!(seqs, [1, 1, 2, 2]);
    }

    #[test]
    fn test_envelope_header() {
        let bus = NotificationBus::new(8);
        let mut sub = bus.subscribe();

        bus.publish_as(
            ActorType::Operator,
            "ops@hive",
            drone_event("DRONE_003", DroneStatus::Offline),
        );

        let envelope = sub.try_recv().unwrap();
        assert_eq!(envelope.event_type, "drone.status_changed");
        assert_eq!(envelope.event_version, CURRENT_EVENT_VERSION);
        assert_eq!(envelope.aggregate_type, AggregateType::Drone);
        assert_eq!(envelope.actor_type, ActorType::Operator);
        assert_eq!(envelope.actor_id, "ops@hive");
        assert!(envelope.correlation_id.is_none());
    }

    #[test]
    fn test_full_queue_drops_for_that_subscriber_only() {
        let bus = NotificationBus::new(1);
        let mut slow = bus.subscribe();
        let mut fast = bus.subscribe();

        bus.publish(drone_event("DRONE_001", DroneStatus::Assigned));
        assert!(fast.try_recv().is_some());
        bus.publish(drone_event("DRONE_001", DroneStatus::InFlight));

        assert_eq!(bus.dropped_count(), 1);
        assert_eq!(slow.try_recv().unwrap().event_id.value(), 1);
        assert!(slow.try_recv().is_none());
        assert_eq!(fast.try_recv().unwrap().event_id.value(), 2);
    }

    #[test]
    fn test_dropped_subscription_is_pruned() {
        let bus = NotificationBus::new(4);
        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        drop(sub);
        bus.publish(drone_event("DRONE_001", DroneStatus::Assigned));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe_unknown_is_false() {
        let bus = NotificationBus::default();
        assert!(!bus.unsubscribe(SubscriptionId::new()));
    }
}
