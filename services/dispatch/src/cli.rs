//! Command-line arguments and logging setup.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use hive_dispatch::{default_fleet, Drone};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// hive-dispatch - drone allocation engine.
///
/// Reads one JSON request per line on stdin and answers one JSON response
/// per line on stdout. Logs go to stderr.
#[derive(Debug, Parser)]
#[command(name = "hive-dispatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON file holding the fleet as an array of drones.
    ///
    /// The built-in reference fleet is used when omitted.
    #[arg(long, env = "HIVE_FLEET_FILE")]
    pub fleet: Option<PathBuf>,

    /// Log output format.
    #[arg(long, env = "HIVE_LOG_FORMAT", value_enum, default_value = "json")]
    pub log_format: LogFormat,

    /// Log level used when RUST_LOG is unset.
    #[arg(long, env = "HIVE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Initialize tracing. `RUST_LOG` takes precedence over `--log-level`.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_level));
        let registry = tracing_subscriber::registry().with(filter);

        match self.log_format {
            LogFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init(),
            LogFormat::Pretty => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .init(),
        }
    }

    /// Loads the configured fleet, or the reference fleet.
    pub fn load_fleet(&self) -> Result<Vec<Drone>> {
        let Some(path) = &self.fleet else {
            return Ok(default_fleet());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fleet file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse fleet file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "hive-dispatch",
            "--fleet",
            "/etc/hive/fleet.json",
            "--log-format",
            "pretty",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Pretty);
        assert_eq!(cli.fleet, Some(PathBuf::from("/etc/hive/fleet.json")));
    }

    #[test]
    fn test_missing_fleet_file_is_error() {
        let cli = Cli::try_parse_from(["hive-dispatch", "--fleet", "/nonexistent/fleet.json"])
            .unwrap();
        let err = cli.load_fleet().unwrap_err();
        assert!(err.to_string().contains("failed to read fleet file"));
    }
}
