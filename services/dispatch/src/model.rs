//! Fleet, job and assignment records.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use hive_events::{AssignmentStatus, DroneStatus, GeoPoint};
use hive_id::{AssignmentId, DroneId, JobId};
use serde::{Deserialize, Serialize};

// =============================================================================
// Drone
// =============================================================================

/// How well a drone tolerates bad weather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherResistance {
    Low,
    #[default]
    Moderate,
    High,
}

/// Static flight characteristics of a drone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneCapabilities {
    pub max_payload_kg: f64,
    /// Charge level, 0 to 100.
    pub battery_percent: f64,
    pub max_range_km: f64,
    pub cruise_speed_kmh: f64,
    pub operational_altitude_m: f64,
    #[serde(default)]
    pub weather_resistance: WeatherResistance,
    #[serde(default)]
    pub supported_cargo_tags: BTreeSet<String>,
    pub max_flight_minutes: u32,
}

/// Historical performance figures, each in `[0, 1]`.
///
/// Owned by the telemetry side; the engine only reads them when scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityMetrics {
    pub efficiency: f64,
    pub reliability: f64,
    pub energy_optimization: f64,
    pub route_intelligence: f64,
    pub collaborative_score: f64,
}

impl ReliabilityMetrics {
    /// Weighted composite used by the hive score.
    pub fn composite(&self) -> f64 {
        0.25 * self.efficiency
            + 0.20 * self.reliability
            + 0.15 * self.energy_optimization
            + 0.25 * self.route_intelligence
            + 0.15 * self.collaborative_score
    }

    pub(crate) fn values(&self) -> [(&'static str, f64); 5] {
        [
            ("efficiency", self.efficiency),
            ("reliability", self.reliability),
            ("energy_optimization", self.energy_optimization),
            ("route_intelligence", self.route_intelligence),
            ("collaborative_score", self.collaborative_score),
        ]
    }
}

/// A fleet member as seen in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drone {
    pub id: DroneId,
    /// Payout address; passed through, never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    pub location: GeoPoint,
    pub status: DroneStatus,
    pub capabilities: DroneCapabilities,
    pub reliability: ReliabilityMetrics,
}

// =============================================================================
// Job
// =============================================================================

/// Weather reported for a job.
///
/// Tags the engine does not recognise are kept verbatim and score with a
/// neutral default instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WeatherCondition {
    #[default]
    Clear,
    LightRain,
    HeavyRain,
    Wind,
    Fog,
    Unknown(String),
}

impl WeatherCondition {
    pub fn as_str(&self) -> &str {
        match self {
            WeatherCondition::Clear => "clear",
            WeatherCondition::LightRain => "light_rain",
            WeatherCondition::HeavyRain => "heavy_rain",
            WeatherCondition::Wind => "wind",
            WeatherCondition::Fog => "fog",
            WeatherCondition::Unknown(tag) => tag,
        }
    }
}

impl From<&str> for WeatherCondition {
    fn from(tag: &str) -> Self {
        match tag {
            "clear" => WeatherCondition::Clear,
            "light_rain" => WeatherCondition::LightRain,
            "heavy_rain" => WeatherCondition::HeavyRain,
            "wind" => WeatherCondition::Wind,
            "fog" => WeatherCondition::Fog,
            other => WeatherCondition::Unknown(other.to_string()),
        }
    }
}

impl From<String> for WeatherCondition {
    fn from(tag: String) -> Self {
        WeatherCondition::from(tag.as_str())
    }
}

impl From<WeatherCondition> for String {
    fn from(condition: WeatherCondition) -> Self {
        match condition {
            WeatherCondition::Unknown(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A delivery request, validated upstream by the API layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<GeoPoint>,
    pub weight_kg: f64,
    #[serde(default)]
    pub weather_condition: WeatherCondition,
    /// Opaque amount forwarded to the payment collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<f64>,
}

impl Job {
    /// Pickup point, if present and well-formed.
    pub fn valid_pickup(&self) -> Option<GeoPoint> {
        self.pickup.filter(GeoPoint::is_valid)
    }

    /// Delivery point, if present and well-formed.
    pub fn valid_delivery(&self) -> Option<GeoPoint> {
        self.delivery.filter(GeoPoint::is_valid)
    }
}

// =============================================================================
// Assignment
// =============================================================================

/// The ledger record binding a job to the drone that won it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub assignment_id: AssignmentId,
    pub job_id: JobId,
    pub drone_id: DroneId,
    pub assigned_at: DateTime<Utc>,
    pub status: AssignmentStatus,
    pub status_changed_at: DateTime<Utc>,
    pub eta_minutes: u32,
    pub hive_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<f64>,
}
