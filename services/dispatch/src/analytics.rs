//! Fleet-wide summary figures.

use hive_events::DroneStatus;
use serde::Serialize;

use crate::model::Drone;

/// Aggregate view of the fleet at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetAnalytics {
    pub total_drones: usize,
    pub available_drones: usize,
    pub average_battery: f64,
    pub total_capacity_kg: f64,
    pub average_efficiency: f64,
    pub average_reliability: f64,
    /// `0.6 * avg collaborative score + 0.4 * avg energy optimization`.
    pub network_optimization: f64,
    /// Jobs that are assigned or in progress.
    pub active_operations: usize,
}

impl FleetAnalytics {
    /// Computes the summary from a fleet snapshot. Averages are 0 for an
    /// empty fleet.
    pub fn from_snapshot(drones: &[Drone], active_operations: usize) -> Self {
        let total_drones = drones.len();
        let mean = |f: fn(&Drone) -> f64| -> f64 {
            if drones.is_empty() {
                0.0
            } else {
                drones.iter().map(f).sum::<f64>() / total_drones as f64
            }
        };

        let collaborative = mean(|d| d.reliability.collaborative_score);
        let energy = mean(|d| d.reliability.energy_optimization);

        Self {
            total_drones,
            available_drones: drones
                .iter()
                .filter(|d| d.status == DroneStatus::Available)
                .count(),
            average_battery: mean(|d| d.capabilities.battery_percent),
            total_capacity_kg: drones.iter().map(|d| d.capabilities.max_payload_kg).sum(),
            average_efficiency: mean(|d| d.reliability.efficiency),
            average_reliability: mean(|d| d.reliability.reliability),
            network_optimization: 0.6 * collaborative + 0.4 * energy,
            active_operations,
        }
    }
}
