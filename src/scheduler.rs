//! Polling scheduler for periodic mode.

use crate::inventory::report::get_inventory_reports_for_region;
use crate::reporter::ReportClient;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Reports the region's inventory every `interval`, forever.
///
/// Each cycle is awaited before the next tick is taken, so a slow cycle delays
/// the following one instead of running alongside it. Cycle errors are logged
/// and the next cycle runs as scheduled.
pub async fn periodically_get_inventory_report(
    interval: Duration,
    region: Option<String>,
    reporter: Arc<ReportClient>,
    quiet: bool,
    dry_run: bool,
) {
    info!(interval = ?interval, "Starting periodic inventory collection");
    run_every(interval, || {
        let region = region.clone();
        let reporter = Arc::clone(&reporter);
        async move {
            if let Err(err) =
                get_inventory_reports_for_region(region, reporter, quiet, dry_run).await
            {
                error!(error = %err, "Failed to get Inventory Reports for region");
            }
        }
    })
    .await;
}

async fn run_every<F, Fut>(interval: Duration, mut cycle: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        cycle().await;
    }
}
