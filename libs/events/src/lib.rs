//! # hive-events
//!
//! Shared status vocabulary and event definitions for the hive dispatch engine.
//!
//! ## Design Principles
//!
//! - Events are immutable records of state transitions that already happened
//! - Every event belongs to exactly one aggregate (a job or a drone)
//! - Events never carry payment data beyond the opaque amount the caller supplied
//! - Events are versioned for schema evolution
//!
//! ## Event Envelope
//!
//! All events share a common envelope with:
//! - Global ordering (`event_id`, assigned by the publisher)
//! - Aggregate ordering (`aggregate_type`, `aggregate_id`, `aggregate_seq`)
//! - Audit context (`actor_type`, `actor_id`)
//! - Correlation (`correlation_id`, usually the job ID)
//!
//! ## Event Types
//!
//! - Assignment events (`assignment.*`)
//! - Drone events (`drone.*`)

mod envelope;
mod error;
mod types;

pub use envelope::*;
pub use error::EventError;
pub use types::*;
