//! anchore-ecs-inventory - Reports the container images running in Amazon ECS to Anchore
//!
//! Every cluster in a region is inventoried concurrently: its tasks, services and
//! containers are collected through the AWS SDK for Rust, assembled into one
//! report per cluster, and posted to the Anchore ECS inventory API and/or
//! printed to stdout. The collection runs once (adhoc) or on an interval
//! (periodic).

mod aws;
mod cli;
mod config;
mod connection;
mod error;
mod inventory;
mod logger;
mod reporter;
mod scheduler;
mod tracker;

#[cfg(test)]
mod fake_anchore;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Mode};
use config::AppConfig;
use reporter::{ApiPath, ReportClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Application entry point.
///
/// Loads configuration, initializes logging, and runs the selected mode. Errors
/// before logging is up are printed to stderr by the returned `anyhow::Error`.
///
/// # Errors
/// This function will return an error if:
/// - The configuration cannot be loaded or is inconsistent
/// - Logging cannot be initialized
/// - The Anchore HTTP client cannot be built
/// - In adhoc mode, the region's inventory cannot be collected
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(&cli)?;
    let level = config.log_level(cli.verbose)?;
    logger::init(&level, config.log.file.as_deref())?;
    info!(mode = %cli.mode, version = env!("CARGO_PKG_VERSION"), "Starting anchore-ecs-inventory");

    match &config.source {
        Some(path) => info!(path = %path.display(), "Using config file"),
        None => info!("No config file found, using defaults"),
    }
    debug!("Application config:\n{config}");

    let reporter = Arc::new(
        ReportClient::new(config.anchore.clone(), Arc::new(ApiPath::new()))
            .context("Failed to create Anchore client")?,
    );

    match cli.mode {
        Mode::Adhoc => {
            inventory::report::get_inventory_reports_for_region(
                config.region.clone(),
                reporter,
                config.quiet,
                config.dry_run,
            )
            .await
            .map_err(|err| {
                error!(error = %err, "Failed to get Inventory Reports for region");
                err
            })
            .context("Failed to get Inventory Reports for region")?;
        }
        Mode::Periodic => {
            scheduler::periodically_get_inventory_report(
                Duration::from_secs(config.polling_interval_seconds),
                config.region.clone(),
                reporter,
                config.quiet,
                config.dry_run,
            )
            .await;
        }
    }

    Ok(())
}
