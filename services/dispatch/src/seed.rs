//! Reference fleet.
//!
//! Four drones around north-west Delhi. Used by the binary when no fleet
//! file is configured, and by tests.

use hive_events::{DroneStatus, GeoPoint};
use hive_id::DroneId;

use crate::model::{Drone, DroneCapabilities, ReliabilityMetrics, WeatherResistance};

struct Profile {
    id: &'static str,
    wallet: &'static str,
    location: (f64, f64),
    max_payload_kg: f64,
    battery_percent: f64,
    max_range_km: f64,
    cruise_speed_kmh: f64,
    operational_altitude_m: f64,
    weather_resistance: WeatherResistance,
    cargo: &'static [&'static str],
    max_flight_minutes: u32,
    // efficiency, reliability, energy, route, collaborative
    metrics: [f64; 5],
}

const PROFILES: [Profile; 4] = [
    Profile {
        id: "DRONE_001",
        wallet: "0x8fb844ab2e58d08cfe01d8a0ebaa2351c3be1177",
        location: (28.7041, 77.1025),
        max_payload_kg: 5.0,
        battery_percent: 90.0,
        max_range_km: 30.0,
        cruise_speed_kmh: 45.0,
        operational_altitude_m: 120.0,
        weather_resistance: WeatherResistance::Moderate,
        cargo: &["electronics", "documents", "small_packages"],
        max_flight_minutes: 180,
        metrics: [0.92, 0.89, 0.94, 0.87, 0.91],
    },
    Profile {
        id: "DRONE_002",
        wallet: "0xf1A68c0D4c1A8de334240050899324B713Cfc677",
        location: (28.7200, 77.1100),
        max_payload_kg: 8.0,
        battery_percent: 85.0,
        max_range_km: 35.0,
        cruise_speed_kmh: 50.0,
        operational_altitude_m: 150.0,
        weather_resistance: WeatherResistance::High,
        cargo: &["electronics", "documents", "small_packages", "medicine"],
        max_flight_minutes: 200,
        metrics: [0.94, 0.91, 0.93, 0.90, 0.92],
    },
    Profile {
        id: "DRONE_003",
        wallet: "0x742d35Cc6634C0532925a3b8D6Eb97E3Ba78A85A",
        location: (28.6900, 77.0950),
        max_payload_kg: 6.0,
        battery_percent: 95.0,
        max_range_km: 25.0,
        cruise_speed_kmh: 40.0,
        operational_altitude_m: 100.0,
        weather_resistance: WeatherResistance::Moderate,
        cargo: &["electronics", "documents", "food"],
        max_flight_minutes: 160,
        metrics: [0.90, 0.93, 0.96, 0.85, 0.89],
    },
    Profile {
        id: "DRONE_004",
        wallet: "0x9aB5c206516c34896D41DB511BAB9E878F8C1C888",
        location: (28.7150, 77.1200),
        max_payload_kg: 4.0,
        battery_percent: 88.0,
        max_range_km: 20.0,
        cruise_speed_kmh: 55.0,
        operational_altitude_m: 130.0,
        weather_resistance: WeatherResistance::Low,
        cargo: &["documents", "small_packages"],
        max_flight_minutes: 140,
        metrics: [0.88, 0.87, 0.90, 0.92, 0.85],
    },
];

/// The reference fleet, every drone `available`.
pub fn default_fleet() -> Vec<Drone> {
    PROFILES.iter().map(Profile::to_drone).collect()
}

impl Profile {
    fn to_drone(&self) -> Drone {
        let [efficiency, reliability, energy_optimization, route_intelligence, collaborative_score] =
            self.metrics;

        Drone {
            id: DroneId::from_static(self.id),
            wallet_address: Some(self.wallet.to_string()),
            location: GeoPoint::new(self.location.0, self.location.1),
            status: DroneStatus::Available,
            capabilities: DroneCapabilities {
                max_payload_kg: self.max_payload_kg,
                battery_percent: self.battery_percent,
                max_range_km: self.max_range_km,
                cruise_speed_kmh: self.cruise_speed_kmh,
                operational_altitude_m: self.operational_altitude_m,
                weather_resistance: self.weather_resistance,
                supported_cargo_tags: self.cargo.iter().map(|t| t.to_string()).collect(),
                max_flight_minutes: self.max_flight_minutes,
            },
            reliability: ReliabilityMetrics {
                efficiency,
                reliability,
                energy_optimization,
                route_intelligence,
                collaborative_score,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::FleetRegistry;

    #[test]
    fn test_default_fleet_registers() {
        let fleet = FleetRegistry::new(default_fleet()).unwrap();
        assert_eq!(fleet.len(), 4);
        assert_eq!(fleet.available().len(), 4);
    }

    #[test]
    fn test_medicine_only_on_high_resistance_drone() {
        let carriers: Vec<_> = default_fleet()
            .into_iter()
            .filter(|d| d.capabilities.supported_cargo_tags.contains("medicine"))
            .map(|d| d.id.to_string())
            .collect();
        assert_eq!(carriers, ["DRONE_002"]);
    }
}
