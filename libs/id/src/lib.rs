//! # hive-id
//!
//! Typed identifiers for the hive dispatch engine.
//!
//! ## Design Principles
//!
//! - Drones and jobs are named by the caller; the engine never invents those names
//! - Records the engine creates (assignments, subscriptions) get ULID-based IDs
//! - All IDs have a canonical string representation with strict parsing
//! - IDs are typed so a job ID can never be passed where a drone ID is expected
//!
//! ## ID Formats
//!
//! Caller-supplied name IDs are stored verbatim:
//! - `DRONE_001`
//! - `job-2024-10-17-0042`
//!
//! Generated IDs use a prefixed format: `{prefix}_{ulid}`
//! - `asgn_01HV4Z2WQXKJNM8GPQY6VBKC3D`
//! - `sub_01HV4Z3MXNKPQR9HSTZ7WCLD4E`

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use macros::{validate_name, MAX_NAME_ID_LEN};
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
