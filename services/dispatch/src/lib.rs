//! Hive dispatch engine.
//!
//! Picks the best available drone for each delivery job, tracks the job's
//! assignment through its lifecycle, estimates delivery time, and notifies
//! observers of every state change.
//!
//! ## Architecture
//!
//! ```text
//! Dispatcher
//! ├── FleetRegistry    (drone status/location, compare-and-set transitions)
//! ├── ScoringEngine    (hive score, candidate ranking)
//! ├── EtaEstimator     (two-leg flight time)
//! ├── JobLedger        (one assignment per job, forward-only lifecycle)
//! └── NotificationBus  (per-subscriber bounded fan-out)
//! ```
//!
//! Scoring and ETA take a [`DistanceModel`]; the default is
//! [`GreatCircle`].
//!
//! ## Example
//!
//! ```
//! use hive_dispatch::{default_fleet, Dispatcher, EngineConfig, FleetRegistry, Job};
//! use hive_events::GeoPoint;
//!
//! let fleet = FleetRegistry::new(default_fleet()).unwrap();
//! let dispatcher = Dispatcher::new(fleet, EngineConfig::default());
//!
//! let job = Job {
//!     id: "job-1".parse().unwrap(),
//!     pickup: Some(GeoPoint::new(28.7041, 77.1025)),
//!     delivery: Some(GeoPoint::new(28.6139, 77.2090)),
//!     weight_kg: 2.5,
//!     weather_condition: Default::default(),
//!     payment_amount: None,
//! };
//!
//! let assignment = dispatcher.allocate(&job).unwrap();
//! assert_eq!(assignment.drone_id.as_str(), "DRONE_001");
//! ```

pub mod analytics;
pub mod bus;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod eta;
pub mod fleet;
pub mod geo;
pub mod ledger;
pub mod model;
pub mod protocol;
pub mod scoring;
pub mod seed;

pub use analytics::FleetAnalytics;
pub use bus::{NotificationBus, Subscription};
pub use config::{ConfigError, EngineConfig};
pub use coordinator::Dispatcher;
pub use error::{AllocationError, DispatchResult, FleetError, LedgerError};
pub use eta::EtaEstimator;
pub use fleet::FleetRegistry;
pub use geo::{DistanceModel, GreatCircle};
pub use ledger::{JobLedger, TransitionOutcome};
pub use model::{
    Assignment, Drone, DroneCapabilities, Job, ReliabilityMetrics, WeatherCondition,
    WeatherResistance,
};
pub use scoring::{RankedCandidate, ScoreBreakdown, ScoringEngine};
pub use seed::default_fleet;
