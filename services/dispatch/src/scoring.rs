//! Hive score.
//!
//! A weighted sum of five sub-scores, dominated by nearness to the pickup:
//!
//! | component   | weight | value                                        |
//! |-------------|--------|----------------------------------------------|
//! | distance    | 0.70   | linear to 0 over 10 km, then `exp(-km/100)`  |
//! | battery     | 0.10   | `battery_percent / 100`                      |
//! | capacity    | 0.10   | 1 if the payload fits, else 0                |
//! | weather     | 0.05   | lookup on condition and resistance           |
//! | reliability | 0.05   | [`composite`](crate::model::ReliabilityMetrics::composite)        |
//!
//! Over-capacity drones are penalised, not excluded.

use std::sync::Arc;

use serde::Serialize;

use crate::geo::{DistanceModel, GreatCircle};
use crate::model::{Drone, Job, WeatherCondition, WeatherResistance};

/// Score used when a job has no usable pickup point.
pub const DEFAULT_SCORE: f64 = 0.75;

/// Below this distance the distance score falls off linearly.
pub const NEAR_RANGE_KM: f64 = 10.0;

const LONG_RANGE_DECAY_KM: f64 = 100.0;

const DISTANCE_WEIGHT: f64 = 0.70;
const BATTERY_WEIGHT: f64 = 0.10;
const CAPACITY_WEIGHT: f64 = 0.10;
const WEATHER_WEIGHT: f64 = 0.05;
const RELIABILITY_WEIGHT: f64 = 0.05;

/// Sub-scores behind a hive score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub distance_km: f64,
    pub distance: f64,
    pub battery: f64,
    pub capacity: f64,
    pub weather: f64,
    pub reliability: f64,
    pub total: f64,
}

/// A candidate with its score, as ranked for one job.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub drone: Drone,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// Scores drones against jobs.
#[derive(Clone)]
pub struct ScoringEngine {
    distance: Arc<dyn DistanceModel>,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(Arc::new(GreatCircle))
    }
}

impl std::fmt::Debug for ScoringEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringEngine").finish_non_exhaustive()
    }
}

impl ScoringEngine {
    pub fn new(distance: Arc<dyn DistanceModel>) -> Self {
        Self { distance }
    }

    /// Hive score of `drone` for `job`.
    pub fn score(&self, drone: &Drone, job: &Job) -> f64 {
        self.breakdown(drone, job)
            .map_or(DEFAULT_SCORE, |b| b.total)
    }

    /// Component sub-scores, or `None` when the pickup is missing or
    /// malformed.
    pub fn breakdown(&self, drone: &Drone, job: &Job) -> Option<ScoreBreakdown> {
        let pickup = job.valid_pickup()?;
        let caps = &drone.capabilities;

        let distance_km = self.distance.distance_km(drone.location, pickup);
        let distance = distance_score(distance_km);
        let battery = caps.battery_percent / 100.0;
        let capacity = if job.weight_kg <= caps.max_payload_kg {
            1.0
        } else {
            0.0
        };
        let weather = weather_score(&job.weather_condition, caps.weather_resistance);
        let reliability = drone.reliability.composite();

        let total = DISTANCE_WEIGHT * distance
            + BATTERY_WEIGHT * battery
            + CAPACITY_WEIGHT * capacity
            + WEATHER_WEIGHT * weather
            + RELIABILITY_WEIGHT * reliability;

        Some(ScoreBreakdown {
            distance_km,
            distance,
            battery,
            capacity,
            weather,
            reliability,
            total,
        })
    }

    /// Scores every candidate and orders them best first.
    ///
    /// The sort is stable, so equal scores keep the order candidates were
    /// given in.
    pub fn rank(&self, candidates: Vec<Drone>, job: &Job) -> Vec<RankedCandidate> {
        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .map(|drone| {
                let breakdown = self.breakdown(&drone, job);
                RankedCandidate {
                    score: breakdown.map_or(DEFAULT_SCORE, |b| b.total),
                    distance_km: breakdown.map(|b| b.distance_km),
                    drone,
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }
}

/// Distance sub-score.
pub fn distance_score(distance_km: f64) -> f64 {
    if distance_km <= NEAR_RANGE_KM {
        (1.0 - distance_km / NEAR_RANGE_KM).max(0.0)
    } else {
        (-distance_km / LONG_RANGE_DECAY_KM).exp()
    }
}

/// Weather sub-score.
pub fn weather_score(condition: &WeatherCondition, resistance: WeatherResistance) -> f64 {
    let high = resistance == WeatherResistance::High;
    match condition {
        WeatherCondition::Clear => 1.0,
        WeatherCondition::LightRain if high => 0.8,
        WeatherCondition::LightRain => 0.4,
        WeatherCondition::HeavyRain if high => 0.6,
        WeatherCondition::HeavyRain => 0.1,
        WeatherCondition::Wind => 0.7,
        WeatherCondition::Fog => 0.5,
        WeatherCondition::Unknown(_) => 0.8,
    }
}
