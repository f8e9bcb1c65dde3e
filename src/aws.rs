//! AWS ECS integration module.
//!
//! This module defines the narrow set of ECS operations the inventory pipeline
//! needs ([`EcsApi`]) and a client wrapper implementing them on top of the AWS SDK.

use crate::error::{InventoryError, Result};
use async_trait::async_trait;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_ecs::types::{Service, Tag, Task};
use aws_sdk_ecs::Client;
use std::future::Future;

/// ECS read operations used to build inventory reports.
///
/// Implementations return API failures unchanged; retrying and batching are left
/// to the caller.
#[async_trait]
pub trait EcsApi: Send + Sync {
    /// Lists the ARNs of every cluster in the region.
    async fn list_clusters(&self) -> Result<Vec<String>>;

    /// Lists the ARNs of the tasks running in a cluster.
    async fn list_tasks(&self, cluster: &str) -> Result<Vec<String>>;

    /// Lists the ARNs of the services defined in a cluster.
    async fn list_services(&self, cluster: &str) -> Result<Vec<String>>;

    /// Describes up to 100 tasks of a cluster.
    async fn describe_tasks(&self, cluster: &str, tasks: &[String]) -> Result<Vec<Task>>;

    /// Describes up to 10 services of a cluster.
    async fn describe_services(&self, cluster: &str, services: &[String]) -> Result<Vec<Service>>;

    /// Lists the tags attached to a task, service or cluster.
    async fn list_tags_for_resource(&self, resource_arn: &str) -> Result<Vec<Tag>>;
}

/// Client for interacting with AWS ECS.
///
/// Wraps the AWS SDK client; list operations follow pagination tokens until
/// every page has been read.
pub struct EcsClient {
    /// AWS ECS SDK client
    client: Client,
}

impl EcsClient {
    /// Creates a new ECS client with an optional region override.
    ///
    /// # Arguments
    /// * `region` - Optional AWS region override (e.g., "us-east-1"); when absent the
    ///   AWS SDK's default resolution (env vars, profile, etc.) applies
    ///
    /// # Returns
    /// Returns a new `EcsClient` once credentials have been resolved successfully.
    ///
    /// # Errors
    /// This function will return an error if AWS credentials cannot be resolved
    /// (missing `~/.aws/credentials`, unset environment variables, expired SSO
    /// session, ...).
    pub async fn new(region: Option<String>) -> Result<Self> {
        let mut config_loader = aws_config::from_env();

        if let Some(region_str) = region.filter(|r| !r.is_empty()) {
            config_loader = config_loader.region(aws_config::Region::new(region_str));
        }

        let config = config_loader.load().await;
        check_aws_credentials(&config).await?;

        Ok(Self {
            client: Client::new(&config),
        })
    }
}

/// Verifies that the loaded AWS configuration can produce credentials.
async fn check_aws_credentials(config: &aws_config::SdkConfig) -> Result<()> {
    let provider = config.credentials_provider().ok_or_else(|| {
        InventoryError::Credentials("no credentials provider configured".to_string())
    })?;

    provider.provide_credentials().await.map_err(|e| {
        InventoryError::Credentials(format!(
            "{e}; check the ~/.aws/credentials file or that the AWS environment variables are set correctly"
        ))
    })?;

    Ok(())
}

/// Follows `nextToken` until the last page, concatenating every page's ARNs.
///
/// `fetch` receives the token for the page to request (`None` for the first)
/// and returns that page's items with the token of the page after it.
pub(crate) async fn collect_pages<F, Fut>(mut fetch: F) -> Result<Vec<String>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<String>, Option<String>)>>,
{
    let mut items = Vec::new();
    let mut next_token = None;

    loop {
        let (page, token) = fetch(next_token).await?;
        items.extend(page);
        match token {
            Some(token) => next_token = Some(token),
            None => return Ok(items),
        }
    }
}

#[async_trait]
impl EcsApi for EcsClient {
    async fn list_clusters(&self) -> Result<Vec<String>> {
        collect_pages(|next_token| async move {
            let resp = self
                .client
                .list_clusters()
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|e| InventoryError::ecs("ListClusters", aws_sdk_ecs::Error::from(e)))?;
            Ok((
                resp.cluster_arns().to_vec(),
                resp.next_token().map(str::to_string),
            ))
        })
        .await
    }

    async fn list_tasks(&self, cluster: &str) -> Result<Vec<String>> {
        collect_pages(|next_token| async move {
            let resp = self
                .client
                .list_tasks()
                .cluster(cluster)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|e| InventoryError::ecs("ListTasks", aws_sdk_ecs::Error::from(e)))?;
            Ok((resp.task_arns().to_vec(), resp.next_token().map(str::to_string)))
        })
        .await
    }

    async fn list_services(&self, cluster: &str) -> Result<Vec<String>> {
        collect_pages(|next_token| async move {
            let resp = self
                .client
                .list_services()
                .cluster(cluster)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|e| InventoryError::ecs("ListServices", aws_sdk_ecs::Error::from(e)))?;
            Ok((
                resp.service_arns().to_vec(),
                resp.next_token().map(str::to_string),
            ))
        })
        .await
    }

    async fn describe_tasks(&self, cluster: &str, tasks: &[String]) -> Result<Vec<Task>> {
        let resp = self
            .client
            .describe_tasks()
            .cluster(cluster)
            .set_tasks(Some(tasks.to_vec()))
            .send()
            .await
            .map_err(|e| InventoryError::ecs("DescribeTasks", aws_sdk_ecs::Error::from(e)))?;

        Ok(resp.tasks().to_vec())
    }

    async fn describe_services(&self, cluster: &str, services: &[String]) -> Result<Vec<Service>> {
        let resp = self
            .client
            .describe_services()
            .cluster(cluster)
            .set_services(Some(services.to_vec()))
            .send()
            .await
            .map_err(|e| InventoryError::ecs("DescribeServices", aws_sdk_ecs::Error::from(e)))?;

        Ok(resp.services().to_vec())
    }

    async fn list_tags_for_resource(&self, resource_arn: &str) -> Result<Vec<Tag>> {
        let resp = self
            .client
            .list_tags_for_resource()
            .resource_arn(resource_arn)
            .send()
            .await
            .map_err(|e| {
                InventoryError::ecs("ListTagsForResource", aws_sdk_ecs::Error::from(e))
            })?;

        Ok(resp.tags().to_vec())
    }
}
