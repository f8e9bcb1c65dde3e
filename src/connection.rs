//! Connection details for the Anchore inventory endpoint.

use serde::{Deserialize, Serialize};

/// Where and as whom inventory reports are posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AnchoreInfo {
    /// Base URL of the Anchore API (e.g., "https://anchore.example.com")
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Value sent in the `x-anchore-account` header
    #[serde(default = "default_account")]
    pub account: String,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Settings for the HTTP client itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure: bool,
    /// Per-request timeout
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_account() -> String {
    "admin".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

impl Default for AnchoreInfo {
    fn default() -> Self {
        Self {
            url: String::new(),
            user: String::new(),
            password: String::new(),
            account: default_account(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl AnchoreInfo {
    /// Returns whether enough details are present to post a report.
    pub fn is_valid(&self) -> bool {
        !self.url.is_empty() && !self.user.is_empty() && !self.password.is_empty()
    }
}
