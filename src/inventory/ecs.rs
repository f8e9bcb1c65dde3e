//! Fetches ECS resources and turns them into report entities.
//!
//! ECS agents older than 1.70.0 record digest-pinned images (`image@sha256:...`)
//! without their friendly tag and sometimes without a digest at all; image tags
//! are repaired here from other containers running the same digest.

use crate::aws::EcsApi;
use crate::error::{InventoryError, Result};
use crate::inventory::UNKNOWN;
use crate::reporter::{Container, Service, Tags, Task};
use crate::tracker::TrackTime;
use aws_sdk_ecs::types as ecs;
use std::collections::HashMap;
use tracing::warn;

/// DescribeTasks accepts at most 100 task ARNs per call.
const DESCRIBE_TASKS_BATCH_SIZE: usize = 100;
/// DescribeServices accepts at most 10 service ARNs per call.
const DESCRIBE_SERVICES_BATCH_SIZE: usize = 10;

pub async fn fetch_clusters(client: &dyn EcsApi) -> Result<Vec<String>> {
    let _timer = TrackTime::new("Fetching list of clusters");
    client.list_clusters().await
}

pub async fn fetch_tasks_from_cluster(client: &dyn EcsApi, cluster: &str) -> Result<Vec<String>> {
    let _timer = TrackTime::new(format!("Fetching tasks from cluster: {cluster}"));
    client.list_tasks(cluster).await
}

pub async fn fetch_services_from_cluster(
    client: &dyn EcsApi,
    cluster: &str,
) -> Result<Vec<String>> {
    let _timer = TrackTime::new(format!("Fetching services from cluster: {cluster}"));
    client.list_services(cluster).await
}

/// Describes tasks in batches the API accepts, keeping request order.
pub async fn describe_tasks(
    client: &dyn EcsApi,
    cluster: &str,
    tasks: &[String],
) -> Result<Vec<ecs::Task>> {
    let mut described = Vec::with_capacity(tasks.len());
    for batch in tasks.chunks(DESCRIBE_TASKS_BATCH_SIZE) {
        described.extend(client.describe_tasks(cluster, batch).await?);
    }
    Ok(described)
}

/// Builds report containers from described tasks, repairing digest-pinned image tags.
pub fn fetch_containers_from_tasks(cluster: &str, tasks: &[ecs::Task]) -> Vec<Container> {
    let _timer = TrackTime::new(format!("Fetching Containers from tasks for cluster: {cluster}"));
    let container_tag_map = build_container_tag_map(tasks);

    let mut containers = Vec::new();
    for task in tasks {
        for container in task.containers() {
            let digest = match container.image_digest() {
                Some(digest) => digest.to_string(),
                None => {
                    warn!(
                        container = container.container_arn().unwrap_or("<nil>"),
                        "No image digest found for container"
                    );
                    warn!("Ensure all ECS container hosts are running at least ECS Agent 1.70.0, which fixed a bug where image digests were not returned in the DescribeTasks API response.");
                    String::new()
                }
            };

            containers.push(Container {
                arn: container.container_arn().unwrap_or_default().to_string(),
                image_digest: digest,
                image_tag: get_container_image_tag(&container_tag_map, container),
                task_arn: task.task_arn().unwrap_or_default().to_string(),
            });
        }
    }

    containers
}

/// Resolves the tag to report for a container's image.
///
/// Digest-pinned references are replaced by the clean tag of another container
/// with the same digest, or by `<image>:UNKNOWN` when no such container exists.
pub fn get_container_image_tag(
    container_tag_map: &HashMap<String, String>,
    container: &ecs::Container,
) -> String {
    let Some(image) = container.image() else {
        return UNKNOWN.to_string();
    };

    if !image.contains('@') {
        return image.to_string();
    }

    if let Some(tag) = container
        .image_digest()
        .and_then(|digest| container_tag_map.get(digest))
    {
        return tag.clone();
    }

    warn!(image, "No image tag found for container setting to UNKNOWN");
    let repository = image.split('@').next().unwrap_or(image);
    format!("{repository}:{UNKNOWN}")
}

/// Maps image digests to the clean (non digest-pinned) image reference seen for them.
pub fn build_container_tag_map(tasks: &[ecs::Task]) -> HashMap<String, String> {
    let mut container_map = HashMap::new();
    for task in tasks {
        for container in task.containers() {
            if let (Some(image), Some(digest)) = (container.image(), container.image_digest()) {
                if !image.contains('@') {
                    container_map.insert(digest.to_string(), image.to_string());
                }
            }
        }
    }
    container_map
}

/// Builds a service ARN from the cluster ARN and a service name.
///
/// DescribeTasks only reports the owning service by name (in the task group), so
/// the ARN is rebuilt from the partition, region, account and cluster name.
///
/// # Errors
/// Returns [`InventoryError::ClusterArn`] unless the cluster ARN has the shape
/// `arn:<partition>:ecs:<region>:<account>:cluster/<name>` with non-empty region,
/// account and name.
pub fn construct_service_arn(cluster_arn: &str, service_name: &str) -> Result<String> {
    let parse_error = || InventoryError::ClusterArn(cluster_arn.to_string());

    let arn_parts: Vec<&str> = cluster_arn.split(':').collect();
    if arn_parts.len() != 6 {
        return Err(parse_error());
    }
    let partition = arn_parts[1];
    let service = arn_parts[2];
    let region = arn_parts[3];
    let account_id = arn_parts[4];

    let cluster_parts: Vec<&str> = arn_parts[5].split('/').collect();
    if cluster_parts.len() < 2 {
        return Err(parse_error());
    }
    let cluster_name = cluster_parts[1];

    if region.is_empty() || account_id.is_empty() || cluster_name.is_empty() {
        return Err(parse_error());
    }

    Ok(format!(
        "arn:{partition}:{service}:{region}:{account_id}:service/{cluster_name}/{service_name}"
    ))
}

/// Builds report tasks from described tasks, fetching tags for each one.
///
/// # Errors
/// Fails on the first tag lookup error, on a task group that is not
/// `<type>:<name>`, or when a service ARN cannot be rebuilt.
pub async fn fetch_tasks_metadata(
    client: &dyn EcsApi,
    cluster: &str,
    tasks: &[ecs::Task],
) -> Result<Vec<Task>> {
    let mut tasks_metadata = Vec::with_capacity(tasks.len());

    for task in tasks {
        let task_arn = task.task_arn().unwrap_or_default().to_string();
        // Tags are not part of the DescribeTasks response unless asked for
        let tags = fetch_tags_for_resource(client, &task_arn).await?;

        let mut metadata = Task {
            arn: task_arn,
            service_arn: String::new(),
            tags,
            task_def_arn: task.task_definition_arn().unwrap_or_default().to_string(),
        };

        if let Some(group) = task.group() {
            let group_parts: Vec<&str> = group.split(':').collect();
            if group_parts.len() != 2 {
                return Err(InventoryError::TaskGroup(group.to_string()));
            }
            if group_parts[0] == "service" {
                let cluster_arn = task.cluster_arn().unwrap_or(cluster);
                metadata.service_arn = construct_service_arn(cluster_arn, group_parts[1])?;
            }
        }

        tasks_metadata.push(metadata);
    }

    Ok(tasks_metadata)
}

/// Describes services and fetches their tags.
pub async fn fetch_services_metadata(
    client: &dyn EcsApi,
    cluster: &str,
    services: &[String],
) -> Result<Vec<Service>> {
    let mut services_metadata = Vec::with_capacity(services.len());

    for batch in services.chunks(DESCRIBE_SERVICES_BATCH_SIZE) {
        for service in client.describe_services(cluster, batch).await? {
            let service_arn = service.service_arn().unwrap_or_default().to_string();
            let tags = fetch_tags_for_resource(client, &service_arn).await?;
            services_metadata.push(Service {
                arn: service_arn,
                tags,
            });
        }
    }

    Ok(services_metadata)
}

/// Returns the tags on a resource; an empty ARN yields no tags without an API call.
pub async fn fetch_tags_for_resource(client: &dyn EcsApi, resource_arn: &str) -> Result<Tags> {
    if resource_arn.is_empty() {
        return Ok(Tags::new());
    }

    let tags = client.list_tags_for_resource(resource_arn).await?;
    Ok(tags
        .iter()
        .filter_map(|tag| match (tag.key(), tag.value()) {
            (Some(key), Some(value)) => Some((key.to_string(), value.to_string())),
            _ => None,
        })
        .collect())
}
