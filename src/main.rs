mod domain;
mod clients;

mod app_system;

#[cfg(test)]
mod mock_framework;

mod actor_framework;
mod analytics;
mod cli;
mod clock;
mod config;
mod export;
mod order_actor;
mod persistence;

use clap::Parser;
use tracing::{error, info, Instrument};

use crate::app_system::{setup_tracing, OrderSystem};
use crate::cli::Cli;
use crate::config::load_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup tracing once for the entire application
    setup_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    // Create the entire order system (loads persisted orders, starts all actors)
    let system = OrderSystem::start(&config).await?;
    let snapshot = system.order_client.snapshot();
    info!(orders = snapshot.items.len(), last_updated = snapshot.last_updated, "Order system ready");

    let span = tracing::info_span!("command");
    let outcome = cli::run(cli.command, &system.order_client).instrument(span).await;

    // Pending writes must land even when the command failed
    if let Err(e) = system.shutdown().await {
        error!(error = %e, "Failed to persist orders");
        return Err(e.into());
    }

    outcome
}
