//! Inventory report wire format.
//!
//! A [`Report`] is the unit of transmission for one cluster. Empty collections,
//! empty service ARNs and empty tag maps are left out of the JSON document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resource tags, keyed by tag name.
pub type Tags = BTreeMap<String, String>;

/// Snapshot of everything running in a single ECS cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Collection time, RFC3339 in UTC
    pub timestamp: String,
    pub cluster_arn: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<Container>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Service>,
}

/// A running container and the image it was started from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub arn: String,
    /// Empty when the ECS agent did not record a digest
    pub image_digest: String,
    pub image_tag: String,
    pub task_arn: String,
}

/// An ECS task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub arn: String,
    /// Owning service, empty for standalone tasks
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_arn: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: Tags,
    #[serde(rename = "task_definition_arn")]
    pub task_def_arn: String,
}

/// An ECS service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub arn: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: Tags,
}

impl Report {
    /// Creates an empty report for a cluster stamped with the current UTC time.
    pub fn new(cluster_arn: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            cluster_arn: cluster_arn.into(),
            ..Self::default()
        }
    }
}
