//! HTTP client for the Anchore ECS inventory endpoint.
//!
//! The inventory endpoint moved between Anchore Enterprise releases, so the
//! client keeps the last known good API path and renegotiates it through the
//! `/version` endpoint whenever a POST comes back 404. The path is shared by
//! every dispatch in the process; concurrent dispatches may race on it, which
//! at worst costs one extra 404 and version lookup.

use crate::connection::AnchoreInfo;
use crate::error::ReporterError;
use crate::reporter::report::Report;
use crate::tracker::TrackTime;
use reqwest::header::CONTENT_TYPE;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const V1_REPORT_API_PATH: &str = "v1/enterprise/ecs-inventory";
pub const V2_REPORT_API_PATH: &str = "v2/ecs-inventory";
const VERSION_API_PATH: &str = "version";
const ACCOUNT_HEADER: &str = "x-anchore-account";

/// Inventory API contract generations understood by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    /// Anchore Enterprise 4.x and earlier
    V1,
    /// Anchore Enterprise 5.x and later
    V2,
}

impl ApiVersion {
    /// Returns the report endpoint path, relative to the base URL.
    pub fn report_path(self) -> &'static str {
        match self {
            ApiVersion::V1 => V1_REPORT_API_PATH,
            ApiVersion::V2 => V2_REPORT_API_PATH,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => ApiVersion::V1,
            _ => ApiVersion::V2,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ApiVersion::V1 => 1,
            ApiVersion::V2 => 2,
        }
    }
}

/// Last known good inventory API version, shared by all dispatches.
#[derive(Debug)]
pub struct ApiPath(AtomicU8);

impl ApiPath {
    /// Starts at the current (v2) contract.
    pub fn new() -> Self {
        Self(AtomicU8::new(ApiVersion::V2.as_u8()))
    }

    pub fn get(&self) -> ApiVersion {
        ApiVersion::from_u8(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, version: ApiVersion) {
        self.0.store(version.as_u8(), Ordering::Relaxed);
    }
}

impl Default for ApiPath {
    fn default() -> Self {
        Self::new()
    }
}

/// Body of `GET /version`. Only `api.version` drives negotiation.
#[derive(Debug, Default, Deserialize)]
pub struct AnchoreVersion {
    #[serde(default)]
    pub api: ApiInfo,
    #[serde(default)]
    pub db: DbInfo,
    #[serde(default)]
    pub service: ServiceInfo,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiInfo {
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DbInfo {
    #[serde(default)]
    pub schema_version: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceInfo {
    #[serde(default)]
    pub version: String,
}

impl AnchoreVersion {
    /// Maps the reported API major version onto a report contract.
    pub fn report_api_version(&self) -> ApiVersion {
        if self.api.version == "2" {
            ApiVersion::V2
        } else {
            ApiVersion::V1
        }
    }
}

/// Outcome of a single POST attempt that did not fail outright.
enum Delivery {
    Accepted,
    NotFound,
}

/// Posts inventory reports to Anchore.
pub struct ReportClient {
    http: reqwest::Client,
    details: AnchoreInfo,
    api_path: Arc<ApiPath>,
}

impl ReportClient {
    /// Creates a client for the given connection details.
    ///
    /// # Arguments
    /// * `details` - Anchore URL, credentials, account and HTTP settings
    /// * `api_path` - Shared API path state; pass the same handle to every client
    ///   that talks to the same Anchore deployment
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built (e.g., the
    /// TLS backend fails to initialize).
    pub fn new(details: AnchoreInfo, api_path: Arc<ApiPath>) -> Result<Self, ReporterError> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(details.http.insecure);
        if details.http.timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(details.http.timeout_seconds));
        }
        let http = builder.build().map_err(ReporterError::Client)?;

        Ok(Self {
            http,
            details,
            api_path,
        })
    }

    pub fn details(&self) -> &AnchoreInfo {
        &self.details
    }

    /// Serializes a report and posts it to the current inventory endpoint.
    ///
    /// A 404 triggers API version negotiation; if the negotiated endpoint differs
    /// from the one just tried, the report is posted once more to the new
    /// endpoint.
    ///
    /// # Errors
    /// This function will return an error if:
    /// - The report cannot be serialized
    /// - The request fails at the transport level
    /// - Anchore answers with a non-2xx status (401 is reported as a credentials problem)
    /// - The endpoint is still missing after negotiation, or negotiation fails
    /// - A 2xx response carries a body that is not JSON
    pub async fn post(&self, report: &Report) -> Result<(), ReporterError> {
        info!(cluster = %report.cluster_arn, "Reporting results to Anchore");
        let _timer = TrackTime::new(format!(
            "Posting Inventory Report for cluster {}",
            report.cluster_arn
        ));

        let body = serde_json::to_vec(report)?;
        let mut attempted = self.api_path.get();
        let mut retried = false;

        loop {
            match self.send_report(&body, attempted).await? {
                Delivery::Accepted => {
                    debug!("Successfully reported results to Anchore");
                    return Ok(());
                }
                Delivery::NotFound => {
                    let negotiated = match self.fetch_versioned_api_path().await {
                        Ok(version) => version,
                        Err(err) => {
                            self.api_path.set(ApiVersion::V1);
                            return Err(err);
                        }
                    };
                    self.api_path.set(negotiated);

                    let endpoint = self.endpoint(attempted.report_path())?;
                    if negotiated == attempted || retried {
                        return Err(ReporterError::NotFound {
                            endpoint: endpoint.to_string(),
                        });
                    }

                    let next = self.endpoint(negotiated.report_path())?;
                    info!(api_endpoint = %next, "Retrying inventory report with new endpoint");
                    attempted = negotiated;
                    retried = true;
                }
            }
        }
    }

    async fn send_report(&self, body: &[u8], version: ApiVersion) -> Result<Delivery, ReporterError> {
        let endpoint = self.endpoint(version.report_path())?;
        debug!(endpoint = %endpoint, "Reporting results to Anchore");

        let resp = self
            .http
            .post(endpoint.clone())
            .basic_auth(&self.details.user, Some(&self.details.password))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCOUNT_HEADER, &self.details.account)
            .body(body.to_vec())
            .send()
            .await
            .map_err(ReporterError::Transport)?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Delivery::NotFound);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ReporterError::Unauthorized {
                status,
                endpoint: endpoint.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ReporterError::Status {
                status,
                endpoint: endpoint.to_string(),
            });
        }

        let resp_body = resp.bytes().await.map_err(ReporterError::Body)?;
        if !resp_body.is_empty() && serde_json::from_slice::<serde_json::Value>(&resp_body).is_err()
        {
            debug!(body = %String::from_utf8_lossy(&resp_body), "Anchore response body");
            return Err(ReporterError::InvalidResponse {
                endpoint: endpoint.to_string(),
            });
        }

        Ok(Delivery::Accepted)
    }

    /// Asks Anchore which inventory API it serves.
    async fn fetch_versioned_api_path(&self) -> Result<ApiVersion, ReporterError> {
        debug!("Detecting Anchore API version");
        let endpoint = self.endpoint(VERSION_API_PATH)?;

        let resp = self
            .http
            .get(endpoint)
            .send()
            .await
            .map_err(|e| ReporterError::Version(format!("failed to contact Anchore API: {e}")))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(ReporterError::Version(format!(
                "failed to retrieve Anchore API version: HTTP {status}"
            )));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| ReporterError::Version(format!("failed to read Anchore API version: {e}")))?;
        let version: AnchoreVersion = serde_json::from_slice(&body)
            .map_err(|e| ReporterError::Version(format!("failed to parse API version: {e}")))?;

        debug!(
            api = %version.api.version,
            db_schema = %version.db.schema_version,
            service = %version.service.version,
            "Anchore API version"
        );

        Ok(version.report_api_version())
    }

    fn endpoint(&self, path: &str) -> Result<Url, ReporterError> {
        join_url(&self.details.url, path)
    }
}

/// Appends `path` to the base URL segment by segment, keeping any base path.
pub fn join_url(base: &str, path: &str) -> Result<Url, ReporterError> {
    let mut url = Url::parse(base).map_err(|e| ReporterError::Url(format!("{base}: {e}")))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| ReporterError::Url(format!("{base}: cannot be a base URL")))?;
        segments.pop_if_empty();
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
    }
    Ok(url)
}
