//! Allocation coordinator.
//!
//! Ties the fleet, the ledger and the bus together. Allocation is
//! optimistic: candidates are ranked from a snapshot without any lock, and
//! only the winning drone is claimed with a compare-and-set. A lost claim
//! excludes that drone and ranks again from a fresh snapshot.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use hive_events::{
    ActorType, AssignmentCreatedPayload, AssignmentStatus, AssignmentStatusChangedPayload,
    DispatchEvent, DroneStatus, DroneStatusChangedPayload, GeoPoint,
};
use hive_id::{AssignmentId, DroneId, SubscriptionId};
use tracing::{debug, info, instrument, warn};

use crate::analytics::FleetAnalytics;
use crate::bus::{NotificationBus, Subscription};
use crate::config::EngineConfig;
use crate::error::{AllocationError, DispatchResult, LedgerError};
use crate::eta::EtaEstimator;
use crate::fleet::FleetRegistry;
use crate::geo::{DistanceModel, GreatCircle};
use crate::ledger::{JobLedger, TransitionOutcome};
use crate::model::{Assignment, Drone, Job};
use crate::scoring::{RankedCandidate, ScoringEngine};

/// The engine's public face towards the API layer.
#[derive(Debug)]
pub struct Dispatcher {
    fleet: FleetRegistry,
    ledger: JobLedger,
    bus: NotificationBus,
    scoring: ScoringEngine,
    eta: EtaEstimator,
    config: EngineConfig,
}

impl Dispatcher {
    /// Creates a dispatcher using great-circle distances.
    pub fn new(fleet: FleetRegistry, config: EngineConfig) -> Self {
        Self::with_distance_model(fleet, config, Arc::new(GreatCircle))
    }

    /// Creates a dispatcher with a custom distance model.
    pub fn with_distance_model(
        fleet: FleetRegistry,
        config: EngineConfig,
        distance: Arc<dyn DistanceModel>,
    ) -> Self {
        Self {
            fleet,
            ledger: JobLedger::new(),
            bus: NotificationBus::new(config.subscriber_buffer),
            scoring: ScoringEngine::new(distance.clone()),
            eta: EtaEstimator::new(distance),
            config,
        }
    }

    /// Binds `job` to the best available drone.
    ///
    /// On success the drone is `assigned`, the ledger holds the new
    /// assignment, and `assignment.created` plus `drone.status_changed`
    /// have been published.
    #[instrument(skip_all, fields(job_id = %job.id))]
    pub fn allocate(&self, job: &Job) -> DispatchResult<Assignment> {
        if self.ledger.contains(job.id.as_str()) {
            return Err(LedgerError::DuplicateJob(job.id.clone()).into());
        }

        let max_attempts = self
            .config
            .max_allocation_attempts
            .max(self.fleet.len())
            .max(1);
        let mut excluded: HashSet<DroneId> = HashSet::new();

        for attempt in 1..=max_attempts {
            let candidates: Vec<Drone> = self
                .fleet
                .available()
                .into_iter()
                .filter(|d| !excluded.contains(&d.id))
                .collect();
            if candidates.is_empty() {
                info!(attempt, "No drones available");
                return Err(AllocationError::NoDronesAvailable);
            }

            let ranked = self.scoring.rank(candidates, job);
            for candidate in &ranked {
                debug!(
                    drone_id = %candidate.drone.id,
                    score = candidate.score,
                    distance_km = ?candidate.distance_km,
                    "Scored candidate"
                );
            }

            // rank() never shrinks its input, so a winner always exists.
            let Some(winner) = ranked.into_iter().next() else {
                return Err(AllocationError::NoDronesAvailable);
            };

            if self.fleet.try_transition(
                winner.drone.id.as_str(),
                DroneStatus::Available,
                DroneStatus::Assigned,
            ) {
                return self.commit(job, winner);
            }

            warn!(
                drone_id = %winner.drone.id,
                attempt,
                "Lost race for drone, retrying without it"
            );
            excluded.insert(winner.drone.id);
        }

        // Termination guarantee only. Each lost race excludes a distinct
        // drone and the bound covers the whole fleet, so the pool empties first.
        warn!(attempts = max_attempts, "Allocation attempts exhausted");
        Err(AllocationError::AllocationRaceExhausted {
            attempts: max_attempts,
        })
    }

    /// Records a claimed drone's assignment and announces it.
    fn commit(&self, job: &Job, winner: RankedCandidate) -> DispatchResult<Assignment> {
        let drone = winner.drone;
        let now = Utc::now();
        let eta_minutes = self.eta.estimate(&drone, job);

        let assignment = Assignment {
            assignment_id: AssignmentId::new(),
            job_id: job.id.clone(),
            drone_id: drone.id.clone(),
            assigned_at: now,
            status: AssignmentStatus::Assigned,
            status_changed_at: now,
            eta_minutes,
            hive_score: winner.score,
            wallet_address: drone.wallet_address.clone(),
            delivery: job.valid_delivery(),
            payment_amount: job.payment_amount,
        };

        if let Err(e) = self.ledger.record(assignment.clone()) {
            // A concurrent call recorded this job first; release the drone.
            if self.fleet.try_transition(
                drone.id.as_str(),
                DroneStatus::Assigned,
                DroneStatus::Available,
            ) {
                warn!(drone_id = %drone.id, error = %e, "Ledger rejected assignment, drone released");
            } else {
                warn!(
                    drone_id = %drone.id,
                    error = %e,
                    "Ledger rejected assignment and drone left assigned state before release"
                );
            }
            return Err(e.into());
        }

        self.bus
            .publish(DispatchEvent::AssignmentCreated(AssignmentCreatedPayload {
                assignment_id: assignment.assignment_id,
                job_id: assignment.job_id.clone(),
                drone_id: assignment.drone_id.clone(),
                hive_score: assignment.hive_score,
                eta_minutes,
                wallet_address: assignment.wallet_address.clone(),
                payment_amount: assignment.payment_amount,
                assigned_at: now,
            }));
        self.bus
            .publish(DispatchEvent::DroneStatusChanged(DroneStatusChangedPayload {
                drone_id: drone.id.clone(),
                from: DroneStatus::Available,
                to: DroneStatus::Assigned,
                location: drone.location,
                job_id: Some(job.id.clone()),
            }));

        info!(
            drone_id = %drone.id,
            assignment_id = %assignment.assignment_id,
            score = assignment.hive_score,
            eta_minutes,
            "Job allocated"
        );

        Ok(assignment)
    }

    /// Moves a job through its lifecycle and keeps its drone in step.
    ///
    /// Re-applying the current status succeeds without publishing anything.
    #[instrument(skip_all, fields(job_id = %job_id, status = %next))]
    pub fn advance(&self, job_id: &str, next: AssignmentStatus) -> Result<Assignment, LedgerError> {
        let (from, assignment) = match self.ledger.transition(job_id, next)? {
            TransitionOutcome::Unchanged(assignment) => return Ok(assignment),
            TransitionOutcome::Changed { from, assignment } => (from, assignment),
        };

        self.bus.publish(DispatchEvent::AssignmentStatusChanged(
            AssignmentStatusChangedPayload {
                assignment_id: assignment.assignment_id,
                job_id: assignment.job_id.clone(),
                drone_id: assignment.drone_id.clone(),
                from,
                to: next,
                changed_at: assignment.status_changed_at,
            },
        ));
        info!(drone_id = %assignment.drone_id, %from, "Job status changed");

        self.sync_drone(&assignment);
        Ok(assignment)
    }

    /// Applies the drone side of a job status change.
    fn sync_drone(&self, assignment: &Assignment) {
        let drone_id = assignment.drone_id.as_str();
        let moved = match assignment.status {
            AssignmentStatus::Assigned => None,
            AssignmentStatus::InProgress => self
                .release_or_move(drone_id, &[DroneStatus::Assigned], DroneStatus::InFlight, None),
            AssignmentStatus::Delivered => self.release_or_move(
                drone_id,
                &[DroneStatus::InFlight, DroneStatus::Assigned],
                DroneStatus::Available,
                assignment.delivery,
            ),
            AssignmentStatus::Failed => self.release_or_move(
                drone_id,
                &[DroneStatus::InFlight, DroneStatus::Assigned],
                DroneStatus::Available,
                None,
            ),
        };

        match moved {
            Some(from) => {
                if let Some(drone) = self.fleet.get(drone_id) {
                    self.bus
                        .publish(DispatchEvent::DroneStatusChanged(DroneStatusChangedPayload {
                            drone_id: drone.id,
                            from,
                            to: drone.status,
                            location: drone.location,
                            job_id: Some(assignment.job_id.clone()),
                        }));
                }
            }
            None if assignment.status != AssignmentStatus::Assigned => {
                warn!(
                    drone_id = %drone_id,
                    job_status = %assignment.status,
                    "Drone not in expected state, left unchanged"
                );
            }
            None => {}
        }
    }

    /// Tries each `from` status in turn; returns the one that matched.
    fn release_or_move(
        &self,
        drone_id: &str,
        from: &[DroneStatus],
        to: DroneStatus,
        location: Option<GeoPoint>,
    ) -> Option<DroneStatus> {
        from.iter()
            .copied()
            .find(|&status| self.fleet.try_transition_at(drone_id, status, to, location))
    }

    /// Operator-initiated drone status change, e.g. taking a drone offline.
    pub fn set_drone_status(&self, drone_id: &str, from: DroneStatus, to: DroneStatus) -> bool {
        if !self.fleet.try_transition(drone_id, from, to) {
            return false;
        }
        if let Some(drone) = self.fleet.get(drone_id) {
            self.bus.publish_as(
                ActorType::Operator,
                "operator",
                DispatchEvent::DroneStatusChanged(DroneStatusChangedPayload {
                    drone_id: drone.id,
                    from,
                    to,
                    location: drone.location,
                    job_id: None,
                }),
            );
        }
        info!(drone_id = %drone_id, %from, %to, "Drone status set by operator");
        true
    }

    /// Ranks the currently available drones for `job` without claiming any.
    pub fn rank_candidates(&self, job: &Job) -> Vec<RankedCandidate> {
        self.scoring.rank(self.fleet.available(), job)
    }

    pub fn fleet_snapshot(&self) -> Vec<Drone> {
        self.fleet.snapshot()
    }

    pub fn ledger_entry(&self, job_id: &str) -> Result<Assignment, LedgerError> {
        self.ledger
            .get(job_id)
            .ok_or_else(|| LedgerError::UnknownJob(job_id.to_string()))
    }

    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn analytics(&self) -> FleetAnalytics {
        FleetAnalytics::from_snapshot(&self.fleet.snapshot(), self.ledger.active_count())
    }

    /// Events dropped because a subscriber fell behind.
    pub fn dropped_notifications(&self) -> u64 {
        self.bus.dropped_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WeatherCondition;
    use crate::seed::default_fleet;
    use hive_id::JobId;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            FleetRegistry::new(default_fleet()).unwrap(),
            EngineConfig::default(),
        )
    }

    fn job(id: &str, pickup: GeoPoint) -> Job {
        Job {
            id: JobId::parse(id).unwrap(),
            pickup: Some(pickup),
            delivery: Some(GeoPoint::new(28.6139, 77.2090)),
            weight_kg: 2.5,
            weather_condition: WeatherCondition::Clear,
            payment_amount: Some(150.0),
        }
    }

    #[test]
    fn test_allocate_claims_nearest() {
        let dispatcher = dispatcher();
        let assignment = dispatcher
            .allocate(&job("job-1", GeoPoint::new(28.6900, 77.0950)))
            .unwrap();

        assert_eq!(assignment.drone_id.as_str(), "DRONE_003");
        assert_eq!(assignment.payment_amount, Some(150.0));
        assert_eq!(
            dispatcher.fleet.get("DRONE_003").unwrap().status,
            DroneStatus::Assigned
        );
    }

    #[test]
    fn test_duplicate_job_claims_nothing() {
        let dispatcher = dispatcher();
        let j = job("job-1", GeoPoint::new(28.7041, 77.1025));
        dispatcher.allocate(&j).unwrap();

        let err = dispatcher.allocate(&j).unwrap_err();
        assert_eq!(err.kind(), "duplicate_job");
        assert_eq!(dispatcher.fleet.available().len(), 3);
    }

    #[test]
    fn test_commit_rolls_back_on_ledger_conflict() {
        let dispatcher = dispatcher();
        let j = job("job-1", GeoPoint::new(28.7041, 77.1025));
        dispatcher.allocate(&j).unwrap();

        // Simulate a second caller that got past the pre-check.
        let drone = dispatcher.fleet.get("DRONE_002").unwrap();
        assert!(dispatcher.fleet.try_transition(
            "DRONE_002",
            DroneStatus::Available,
            DroneStatus::Assigned
        ));
        let winner = RankedCandidate {
            drone,
            score: 0.5,
            distance_km: None,
        };

        assert!(dispatcher.commit(&j, winner).is_err());
        assert_eq!(
            dispatcher.fleet.get("DRONE_002").unwrap().status,
            DroneStatus::Available
        );
    }

    #[test]
    fn test_commit_conflict_leaves_operator_status_alone() {
        let dispatcher = dispatcher();
        let j = job("job-1", GeoPoint::new(28.7041, 77.1025));
        dispatcher.allocate(&j).unwrap();

        let drone = dispatcher.fleet.get("DRONE_002").unwrap();
        assert!(dispatcher.fleet.try_transition(
            "DRONE_002",
            DroneStatus::Available,
            DroneStatus::Assigned
        ));
        // An operator grounds the drone before the ledger conflict surfaces.
        assert!(dispatcher.fleet.try_transition(
            "DRONE_002",
            DroneStatus::Assigned,
            DroneStatus::Offline
        ));
        let winner = RankedCandidate {
            drone,
            score: 0.5,
            distance_km: None,
        };

        let err = dispatcher.commit(&j, winner).unwrap_err();
        assert_eq!(err.kind(), "duplicate_job");
        assert_eq!(
            dispatcher.fleet.get("DRONE_002").unwrap().status,
            DroneStatus::Offline
        );
    }

    #[test]
    fn test_empty_fleet() {
        let dispatcher = Dispatcher::new(FleetRegistry::new([]).unwrap(), EngineConfig::default());
        assert_eq!(
            dispatcher.allocate(&job("job-1", GeoPoint::new(28.7, 77.1))),
            Err(AllocationError::NoDronesAvailable)
        );
    }

    #[test]
    fn test_set_drone_status_removes_from_pool() {
        let dispatcher = dispatcher();
        assert!(dispatcher.set_drone_status("DRONE_001", DroneStatus::Available, DroneStatus::Offline));
        assert!(!dispatcher.set_drone_status("DRONE_001", DroneStatus::Available, DroneStatus::Offline));

        let ranked = dispatcher.rank_candidates(&job("job-1", GeoPoint::new(28.7041, 77.1025)));
        assert!(ranked.iter().all(|c| c.drone.id.as_str() != "DRONE_001"));
    }

    #[test]
    fn test_ledger_entry_unknown() {
        assert_eq!(
            dispatcher().ledger_entry("nope"),
            Err(LedgerError::UnknownJob("nope".to_string()))
        );
    }
}
