//! hive-dispatch
//!
//! Hosts the dispatch engine behind a newline-delimited JSON protocol on
//! stdin/stdout (see [`hive_dispatch::protocol`]). A background task logs
//! every published event. Shuts down on end of input or Ctrl-C.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use hive_dispatch::{protocol, Dispatcher, EngineConfig, FleetRegistry};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.init_tracing();

    info!("Starting hive-dispatch");

    // Load configuration
    let config = EngineConfig::from_env()?;
    let fleet = FleetRegistry::new(cli.load_fleet()?)?;
    info!(
        drones = fleet.len(),
        subscriber_buffer = config.subscriber_buffer,
        max_allocation_attempts = config.max_allocation_attempts,
        "Configuration loaded"
    );

    let dispatcher = Arc::new(Dispatcher::new(fleet, config));

    // Log every event the engine publishes
    let mut events = dispatcher.subscribe();
    let subscription_id = events.id();
    let event_handle = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            info!(
                event_id = %event.event_id,
                event_type = %event.event_type,
                aggregate_id = %event.aggregate_id,
                aggregate_seq = %event.aggregate_seq,
                actor_type = %event.actor_type,
                "Event"
            );
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Received shutdown signal");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                let response = protocol::handle_line(&dispatcher, &line);
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                stdout.write_all(out.as_bytes()).await?;
                stdout.flush().await?;
            }
        }
    }

    let stats = dispatcher.analytics();
    info!(
        total_drones = stats.total_drones,
        available_drones = stats.available_drones,
        average_battery = stats.average_battery,
        total_capacity_kg = stats.total_capacity_kg,
        average_efficiency = stats.average_efficiency,
        average_reliability = stats.average_reliability,
        network_optimization = stats.network_optimization,
        active_operations = stats.active_operations,
        dropped_notifications = dispatcher.dropped_notifications(),
        "Fleet analytics"
    );

    // Closing the subscription ends the logger once it has drained.
    dispatcher.unsubscribe(subscription_id);
    if let Err(e) = event_handle.await {
        error!(error = %e, "Event logger task panicked");
    }

    info!("hive-dispatch shutdown complete");
    Ok(())
}
