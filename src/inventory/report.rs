//! Per-cluster report assembly, dispatch, and region-wide fan-out.

use crate::aws::{EcsApi, EcsClient};
use crate::error::Result;
use crate::inventory::ecs::{
    describe_tasks, fetch_clusters, fetch_containers_from_tasks, fetch_services_from_cluster,
    fetch_services_metadata, fetch_tasks_from_cluster, fetch_tasks_metadata,
};
use crate::inventory::reconcile::ensure_referenced_objects_exist;
use crate::reporter::{Report, ReportClient};
use crate::tracker::TrackTime;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Collects the in-use images of one cluster into a reconciled report.
///
/// # Arguments
/// * `client` - ECS API implementation
/// * `cluster_arn` - ARN (or name) of the cluster to inventory
///
/// # Returns
/// A report holding the cluster's containers, tasks and services. A cluster with
/// no tasks yields a report without containers.
///
/// # Errors
/// Any failed ECS call, or a task group or cluster ARN that cannot be parsed,
/// fails the whole cluster; no partial report is returned.
pub async fn get_inventory_report_for_cluster(
    client: &dyn EcsApi,
    cluster_arn: &str,
) -> Result<Report> {
    let _timer = TrackTime::new(format!("Getting Inventory Report for cluster: {cluster_arn}"));
    debug!(cluster = %cluster_arn, "Found cluster");

    let mut report = Report::new(cluster_arn);

    let tasks = fetch_tasks_from_cluster(client, cluster_arn).await?;
    let services = fetch_services_from_cluster(client, cluster_arn).await?;

    if services.is_empty() {
        debug!(cluster = %cluster_arn, "No services found in cluster");
    } else {
        report.services = fetch_services_metadata(client, cluster_arn, &services).await?;
    }

    if tasks.is_empty() {
        debug!(cluster = %cluster_arn, "No tasks found in cluster");
    } else {
        debug!(cluster = %cluster_arn, task_count = tasks.len(), "Found tasks in cluster");

        let described = describe_tasks(client, cluster_arn, &tasks).await?;
        report.tasks = fetch_tasks_metadata(client, cluster_arn, &described).await?;
        report.containers = fetch_containers_from_tasks(cluster_arn, &described);
        info!(
            cluster = %cluster_arn,
            container_count = report.containers.len(),
            "Found containers in cluster"
        );
    }

    Ok(ensure_referenced_objects_exist(report))
}

/// Writes a report as indented JSON followed by a newline.
///
/// The document is rendered up front and handed to the writer in one
/// `write_all`, so reports from concurrent clusters never interleave.
pub fn write_report<W: Write>(writer: &mut W, report: &Report) -> Result<()> {
    let mut document = serde_json::to_vec_pretty(report)?;
    document.push(b'\n');
    writer.write_all(&document)?;
    Ok(())
}

/// Sends a report to Anchore and/or prints it, according to the run flags.
///
/// Dry runs never post. Otherwise the report is posted when the Anchore
/// details are complete and skipped when they are not. Unless `quiet` is set
/// the report is also printed to stdout, whatever happened to the POST.
///
/// # Errors
/// Returns an error if the POST fails or the report cannot be printed.
pub async fn handle_report(
    report: &Report,
    reporter: &ReportClient,
    quiet: bool,
    dry_run: bool,
) -> Result<()> {
    dispatch_report(report, reporter, quiet, dry_run, || io::stdout().lock()).await
}

/// `out` is only called once the POST is done, so no writer (or stdout lock) is
/// held across an await.
async fn dispatch_report<W, F>(
    report: &Report,
    reporter: &ReportClient,
    quiet: bool,
    dry_run: bool,
    out: F,
) -> Result<()>
where
    W: Write,
    F: FnOnce() -> W + Send,
{
    if dry_run {
        info!("Dry run specified, not reporting inventory");
    } else if reporter.details().is_valid() {
        reporter.post(report).await?;
    } else {
        debug!("Anchore details not specified, not reporting inventory");
    }

    if !quiet {
        write_report(&mut out(), report)?;
    }
    Ok(())
}

/// Reports every cluster the client can see, one concurrent task per cluster.
///
/// Per-cluster failures are logged and do not stop the other clusters. Returns
/// once every cluster has been handled.
///
/// # Errors
/// Returns an error only if the cluster list cannot be fetched.
pub async fn report_clusters(
    client: Arc<dyn EcsApi>,
    reporter: Arc<ReportClient>,
    quiet: bool,
    dry_run: bool,
) -> Result<()> {
    let clusters = fetch_clusters(client.as_ref()).await?;

    let mut cluster_tasks = JoinSet::new();
    for cluster in clusters {
        let client = Arc::clone(&client);
        let reporter = Arc::clone(&reporter);
        cluster_tasks.spawn(async move {
            report_cluster(client.as_ref(), &reporter, &cluster, quiet, dry_run).await;
        });
    }

    while let Some(joined) = cluster_tasks.join_next().await {
        if let Err(err) = joined {
            error!(error = %err, "Cluster inventory task did not complete");
        }
    }

    Ok(())
}

async fn report_cluster(
    client: &dyn EcsApi,
    reporter: &ReportClient,
    cluster: &str,
    quiet: bool,
    dry_run: bool,
) {
    let report = match get_inventory_report_for_cluster(client, cluster).await {
        Ok(report) => report,
        Err(err) => {
            error!(cluster = %cluster, error = %err, "Failed to get inventory report for cluster");
            return;
        }
    };

    // Clusters without running containers have nothing to report
    if report.containers.is_empty() {
        return;
    }

    if let Err(err) = handle_report(&report, reporter, quiet, dry_run).await {
        error!(cluster = %cluster, error = %err, "Failed to report inventory for cluster");
        match serde_json::to_string(&report) {
            Ok(payload) => error!(payload = %payload, "Failed payload"),
            Err(err) => error!(error = %err, "Unable to serialize failed payload"),
        }
    }
}

/// Collects and reports the inventory of every cluster in a region.
///
/// # Arguments
/// * `region` - Region override; `None` uses the AWS SDK's default resolution
/// * `reporter` - Anchore client shared by all cluster reports
/// * `quiet` - Do not print reports to stdout
/// * `dry_run` - Do not post reports to Anchore
///
/// # Errors
/// Returns an error if AWS credentials cannot be resolved or the cluster list
/// cannot be fetched. Failures of individual clusters are only logged.
pub async fn get_inventory_reports_for_region(
    region: Option<String>,
    reporter: Arc<ReportClient>,
    quiet: bool,
    dry_run: bool,
) -> Result<()> {
    let region_label = region.clone().unwrap_or_else(|| "default".to_string());
    let _timer = TrackTime::new(format!(
        "Getting Inventory Reports for region: {region_label}"
    ));
    info!(region = %region_label, "Getting Inventory Reports for region");

    let client = EcsClient::new(region).await.map_err(|err| {
        error!(error = %err, "Failed to load AWS config");
        err
    })?;

    report_clusters(Arc::new(client), reporter, quiet, dry_run).await
}
