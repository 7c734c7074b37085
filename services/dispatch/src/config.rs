//! Engine configuration.

use thiserror::Error;

/// Default per-subscriber queue depth.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

/// Default lower bound on allocation attempts; the fleet size raises it.
pub const DEFAULT_MAX_ALLOCATION_ATTEMPTS: usize = 8;

/// Errors from reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Tunables for the dispatch engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Events queued per subscriber before new ones are dropped for it.
    pub subscriber_buffer: usize,

    /// Lower bound on claim attempts per allocation.
    pub max_allocation_attempts: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
            max_allocation_attempts: DEFAULT_MAX_ALLOCATION_ATTEMPTS,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to defaults; set but unparseable ones are
    /// an error rather than silently ignored.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let subscriber_buffer = positive(
            "HIVE_SUBSCRIBER_BUFFER",
            lookup("HIVE_SUBSCRIBER_BUFFER"),
            defaults.subscriber_buffer,
        )?;
        let max_allocation_attempts = positive(
            "HIVE_MAX_ALLOCATION_ATTEMPTS",
            lookup("HIVE_MAX_ALLOCATION_ATTEMPTS"),
            defaults.max_allocation_attempts,
        )?;

        Ok(Self {
            subscriber_buffer,
            max_allocation_attempts,
        })
    }
}

fn positive(var: &'static str, raw: Option<String>, default: usize) -> Result<usize, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue { var, value: raw }),
    }
}
