//! Fleet registry.
//!
//! The registry owns every drone's mutable state (status and location).
//! Callers only ever see copies; the compare-and-set transition is the
//! single way status changes, and it is what prevents two allocations
//! from claiming the same drone.

use std::collections::HashMap;

use hive_events::{DroneStatus, GeoPoint};
use hive_id::DroneId;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::FleetError;
use crate::model::Drone;

/// Mutable part of a drone.
#[derive(Debug, Clone, Copy)]
struct DroneState {
    status: DroneStatus,
    location: GeoPoint,
}

/// One fleet member: immutable profile plus its own lock.
#[derive(Debug)]
struct DroneSlot {
    profile: Drone,
    state: Mutex<DroneState>,
}

impl DroneSlot {
    fn view(&self) -> Drone {
        let state = *self.state.lock();
        Drone {
            status: state.status,
            location: state.location,
            ..self.profile.clone()
        }
    }
}

/// The set of known drones, in registration order.
///
/// Membership is fixed at construction; each drone carries its own lock so
/// transitions on different drones never contend.
#[derive(Debug)]
pub struct FleetRegistry {
    slots: Vec<DroneSlot>,
    index: HashMap<DroneId, usize>,
}

impl FleetRegistry {
    /// Builds a registry, validating every drone's static profile.
    pub fn new(drones: impl IntoIterator<Item = Drone>) -> Result<Self, FleetError> {
        let mut slots = Vec::new();
        let mut index = HashMap::new();

        for drone in drones {
            validate(&drone)?;
            if index.contains_key(&drone.id) {
                return Err(FleetError::DuplicateDrone(drone.id));
            }
            index.insert(drone.id.clone(), slots.len());
            slots.push(DroneSlot {
                state: Mutex::new(DroneState {
                    status: drone.status,
                    location: drone.location,
                }),
                profile: drone,
            });
        }

        Ok(Self { slots, index })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Copies of every drone, in registration order.
    pub fn snapshot(&self) -> Vec<Drone> {
        self.slots.iter().map(DroneSlot::view).collect()
    }

    /// Drones currently in `available` status, in registration order.
    pub fn available(&self) -> Vec<Drone> {
        self.snapshot()
            .into_iter()
            .filter(|d| d.status == DroneStatus::Available)
            .collect()
    }

    /// Copy of a single drone.
    pub fn get(&self, drone_id: &str) -> Option<Drone> {
        self.slot(drone_id).map(DroneSlot::view)
    }

    /// Atomically moves a drone from `from` to `to`.
    ///
    /// Returns false without mutating anything if the drone is unknown or
    /// its current status is not `from`.
    pub fn try_transition(&self, drone_id: &str, from: DroneStatus, to: DroneStatus) -> bool {
        self.try_transition_at(drone_id, from, to, None)
    }

    /// Same as [`try_transition`](Self::try_transition), also moving the
    /// drone to `location` when one is given.
    pub fn try_transition_at(
        &self,
        drone_id: &str,
        from: DroneStatus,
        to: DroneStatus,
        location: Option<GeoPoint>,
    ) -> bool {
        let Some(slot) = self.slot(drone_id) else {
            return false;
        };

        let mut state = slot.state.lock();
        if state.status != from {
            debug!(
                drone_id = %drone_id,
                expected = %from,
                actual = %state.status,
                "Drone transition rejected"
            );
            return false;
        }

        state.status = to;
        if let Some(location) = location {
            state.location = location;
        }
        true
    }

    fn slot(&self, drone_id: &str) -> Option<&DroneSlot> {
        self.index.get(drone_id).map(|&i| &self.slots[i])
    }
}

fn validate(drone: &Drone) -> Result<(), FleetError> {
    let invalid = |reason: String| FleetError::InvalidDrone {
        drone_id: drone.id.clone(),
        reason,
    };
    let caps = &drone.capabilities;

    if !drone.location.is_valid() {
        return Err(invalid(format!("location {} out of range", drone.location)));
    }
    if !(caps.cruise_speed_kmh.is_finite() && caps.cruise_speed_kmh > 0.0) {
        return Err(invalid(format!(
            "cruise speed must be positive, got {}",
            caps.cruise_speed_kmh
        )));
    }
    if !(0.0..=100.0).contains(&caps.battery_percent) {
        return Err(invalid(format!(
            "battery must be within 0-100, got {}",
            caps.battery_percent
        )));
    }
    if !(caps.max_payload_kg.is_finite() && caps.max_payload_kg >= 0.0) {
        return Err(invalid(format!(
            "max payload must be non-negative, got {}",
            caps.max_payload_kg
        )));
    }
    for (name, value) in drone.reliability.values() {
        if !(0.0..=1.0).contains(&value) {
            return Err(invalid(format!("{name} must be within 0-1, got {value}")));
        }
    }

    Ok(())
}
