//! Error types for inventory collection and reporting.
//!
//! Collection failures are scoped to a single cluster and reporting failures to a
//! single dispatch; the region orchestrator turns both into log records.

use reqwest::StatusCode;
use thiserror::Error;

/// Boxed source error carried by ECS API failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while collecting or dispatching an inventory report.
#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("ECS {operation} request failed: {source}")]
    Ecs {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("unable to parse cluster ARN: {0}")]
    ClusterArn(String),

    #[error("unable to parse task group: {0}")]
    TaskGroup(String),

    #[error("unable to get AWS credentials: {0}")]
    Credentials(String),

    #[error("unable to report inventory to Anchore: {0}")]
    Report(#[from] ReporterError),

    #[error("unable to show inventory: {0}")]
    Output(#[from] serde_json::Error),

    #[error("unable to write inventory: {0}")]
    Write(#[from] std::io::Error),
}

impl InventoryError {
    /// Wraps a failed ECS API call, keeping the operation name for the log record.
    pub fn ecs(operation: &'static str, source: impl Into<BoxError>) -> Self {
        InventoryError::Ecs {
            operation,
            source: source.into(),
        }
    }
}

/// Errors raised by the Anchore reporting client.
#[derive(Error, Debug)]
pub enum ReporterError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to parse API URL: {0}")]
    Url(String),

    #[error("failed to serialize results as JSON: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to report data to Anchore: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to report data to Anchore, check credentials: HTTP {status} from {endpoint}")]
    Unauthorized { status: StatusCode, endpoint: String },

    #[error("failed to report data to Anchore: HTTP {status} from {endpoint}")]
    Status { status: StatusCode, endpoint: String },

    #[error("failed to report data to Anchore: {endpoint} not found and API version negotiation did not change the endpoint")]
    NotFound { endpoint: String },

    #[error("failed to read response from Anchore: {0}")]
    Body(#[source] reqwest::Error),

    #[error("failed to report data to Anchore, not a valid JSON response from {endpoint}")]
    InvalidResponse { endpoint: String },

    #[error("failed to validate Enterprise API: {0}")]
    Version(String),
}

pub type Result<T> = std::result::Result<T, InventoryError>;
