//! In-memory [`EcsApi`] implementation with fixed fixtures, used by tests.
//!
//! The default fixtures describe two clusters in `us-east-1`: `cluster-1` runs two
//! tasks of `service-1` with four containers between them, `cluster-2` is empty.

use crate::aws::EcsApi;
use crate::error::{InventoryError, Result};
use async_trait::async_trait;
use aws_sdk_ecs::types::{Container, Service, Tag, Task};
use std::collections::HashMap;
use std::sync::Mutex;

pub const CLUSTER_1: &str = "arn:aws:ecs:us-east-1:123456789012:cluster/cluster-1";
pub const CLUSTER_2: &str = "arn:aws:ecs:us-east-1:123456789012:cluster/cluster-2";
pub const TASK_1: &str =
    "arn:aws:ecs:us-east-1:123456789012:task/cluster-1/12345678-1234-1234-1234-000000000000";
pub const TASK_2: &str =
    "arn:aws:ecs:us-east-1:123456789012:task/cluster-1/12345678-1234-1234-1234-111111111111";
pub const SERVICE_1: &str = "arn:aws:ecs:us-east-1:123456789012:service/cluster-1/service-1";
pub const TASK_DEFINITION_1: &str =
    "arn:aws:ecs:us-east-1:123456789012:task-definition/task-definition-1:1";
pub const DIGEST_1: &str =
    "sha256:1234567890123456789012345678901234567890123456789012345678901111";
pub const DIGEST_2: &str =
    "sha256:1234567890123456789012345678901234567890123456789012345678902222";
pub const DIGEST_3: &str =
    "sha256:1234567890123456789012345678901234567890123456789012345678903333";

pub fn container_arn(suffix: &str) -> String {
    format!("arn:aws:ecs:us-east-1:123456789012:container/12345678-1234-1234-1234-{suffix}")
}

pub fn ecs_container(arn: &str, image: Option<&str>, digest: Option<&str>) -> Container {
    Container::builder()
        .container_arn(arn)
        .set_image(image.map(str::to_string))
        .set_image_digest(digest.map(str::to_string))
        .build()
}

pub fn ecs_task(arn: &str, cluster: &str, group: Option<&str>, containers: Vec<Container>) -> Task {
    Task::builder()
        .task_arn(arn)
        .cluster_arn(cluster)
        .task_definition_arn(TASK_DEFINITION_1)
        .set_group(group.map(str::to_string))
        .set_containers(Some(containers))
        .build()
}

pub fn ecs_tag(key: &str, value: &str) -> Tag {
    Tag::builder().key(key).value(value).build()
}

/// Test double for the ECS API.
pub struct MockEcsClient {
    pub error_on_list_clusters: bool,
    pub error_on_list_tasks: bool,
    pub error_on_list_services: bool,
    pub error_on_describe_tasks: bool,
    pub error_on_describe_services: bool,
    pub error_on_list_tags_for_resource: bool,
    pub clusters: Vec<String>,
    pub tasks: Vec<Task>,
    pub services: Vec<Service>,
    pub tags: HashMap<String, Vec<Tag>>,
    /// Operation name and batch size of every describe call made
    pub describe_calls: Mutex<Vec<(&'static str, usize)>>,
}

impl Default for MockEcsClient {
    fn default() -> Self {
        let group = Some("service:service-1");
        let tasks = vec![
            ecs_task(
                TASK_1,
                CLUSTER_1,
                group,
                vec![
                    ecs_container(&container_arn("111111111111"), Some("image-1"), Some(DIGEST_1)),
                    ecs_container(&container_arn("111111111112"), Some("image-2"), Some(DIGEST_2)),
                ],
            ),
            ecs_task(
                TASK_2,
                CLUSTER_1,
                group,
                vec![
                    ecs_container(&container_arn("111111111113"), Some("image-3"), Some(DIGEST_3)),
                    ecs_container(&container_arn("111111111114"), Some("image-3"), Some(DIGEST_3)),
                ],
            ),
        ];
        let services = vec![Service::builder()
            .service_arn(SERVICE_1)
            .cluster_arn(CLUSTER_1)
            .build()];
        let tags = HashMap::from([
            (
                TASK_1.to_string(),
                vec![ecs_tag("key-1", "value-1"), ecs_tag("key-2", "value-2")],
            ),
            (
                SERVICE_1.to_string(),
                vec![ecs_tag("svc-key-1", "svc-value-1"), ecs_tag("svc-key-2", "svc-value-2")],
            ),
        ]);

        Self {
            error_on_list_clusters: false,
            error_on_list_tasks: false,
            error_on_list_services: false,
            error_on_describe_tasks: false,
            error_on_describe_services: false,
            error_on_list_tags_for_resource: false,
            clusters: vec![CLUSTER_1.to_string(), CLUSTER_2.to_string()],
            tasks,
            services,
            tags,
            describe_calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockEcsClient {
    pub fn describe_calls(&self) -> Vec<(&'static str, usize)> {
        self.describe_calls.lock().unwrap().clone()
    }

    fn record(&self, operation: &'static str, batch: usize) {
        self.describe_calls.lock().unwrap().push((operation, batch));
    }
}

/// Matches either a full cluster ARN or a bare cluster name.
fn in_cluster(cluster_arn: Option<&str>, cluster: &str) -> bool {
    match cluster_arn {
        Some(arn) => arn == cluster || arn.rsplit('/').next() == Some(cluster),
        None => false,
    }
}

#[async_trait]
impl EcsApi for MockEcsClient {
    async fn list_clusters(&self) -> Result<Vec<String>> {
        if self.error_on_list_clusters {
            return Err(InventoryError::ecs("ListClusters", "list cluster error"));
        }
        Ok(self.clusters.clone())
    }

    async fn list_tasks(&self, cluster: &str) -> Result<Vec<String>> {
        if self.error_on_list_tasks {
            return Err(InventoryError::ecs("ListTasks", "list tasks error"));
        }
        Ok(self
            .tasks
            .iter()
            .filter(|t| in_cluster(t.cluster_arn(), cluster))
            .filter_map(|t| t.task_arn().map(str::to_string))
            .collect())
    }

    async fn list_services(&self, cluster: &str) -> Result<Vec<String>> {
        if self.error_on_list_services {
            return Err(InventoryError::ecs("ListServices", "list services error"));
        }
        Ok(self
            .services
            .iter()
            .filter(|s| in_cluster(s.cluster_arn(), cluster))
            .filter_map(|s| s.service_arn().map(str::to_string))
            .collect())
    }

    async fn describe_tasks(&self, _cluster: &str, tasks: &[String]) -> Result<Vec<Task>> {
        if self.error_on_describe_tasks {
            return Err(InventoryError::ecs("DescribeTasks", "describe tasks error"));
        }
        self.record("DescribeTasks", tasks.len());
        Ok(tasks
            .iter()
            .filter_map(|arn| {
                self.tasks
                    .iter()
                    .find(|t| t.task_arn() == Some(arn.as_str()))
                    .cloned()
            })
            .collect())
    }

    async fn describe_services(&self, _cluster: &str, services: &[String]) -> Result<Vec<Service>> {
        if self.error_on_describe_services {
            return Err(InventoryError::ecs("DescribeServices", "describe services error"));
        }
        self.record("DescribeServices", services.len());
        Ok(services
            .iter()
            .filter_map(|arn| {
                self.services
                    .iter()
                    .find(|s| s.service_arn() == Some(arn.as_str()))
                    .cloned()
            })
            .collect())
    }

    async fn list_tags_for_resource(&self, resource_arn: &str) -> Result<Vec<Tag>> {
        if self.error_on_list_tags_for_resource {
            return Err(InventoryError::ecs(
                "ListTagsForResource",
                "list tags for resource error",
            ));
        }
        Ok(self.tags.get(resource_arn).cloned().unwrap_or_default())
    }
}
