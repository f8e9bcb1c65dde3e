//! Configuration management for the inventory collector.
//!
//! Settings are read from a TOML file and then overridden by command line flags
//! and `ANCHORE_ECS_INVENTORY_*` environment variables. When no file is given
//! explicitly, the first file found in [`AppConfig::search_paths`] is used.

use crate::cli::Cli;
use crate::connection::AnchoreInfo;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "anchore-ecs-inventory";

const REDACTED: &str = "******";

/// Main configuration structure.
///
/// All options are optional in the file and fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AppConfig {
    /// AWS region to inventory
    /// If not specified, uses the AWS SDK's default resolution (env vars, profile, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Seconds between collections in periodic mode
    #[serde(default = "default_polling_interval_seconds")]
    pub polling_interval_seconds: u64,

    /// Do not print reports to stdout
    #[serde(default)]
    pub quiet: bool,

    /// Do not post reports to Anchore
    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub log: LogConfig,

    /// Anchore connection details
    #[serde(default)]
    pub anchore: AnchoreInfo,

    /// File the configuration was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Logging configuration options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LogConfig {
    /// One of "error", "warn", "info", "debug", "trace"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Append logs to this file instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_polling_interval_seconds() -> u64 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            region: None,
            polling_interval_seconds: default_polling_interval_seconds(),
            quiet: false,
            dry_run: false,
            log: LogConfig::default(),
            anchore: AnchoreInfo::default(),
            source: None,
        }
    }
}

impl AppConfig {
    /// Builds the effective configuration for a run.
    ///
    /// # Arguments
    /// * `cli` - Parsed command line; its values (including those bound from
    ///   environment variables) take precedence over the file
    ///
    /// # Returns
    /// The merged configuration. `source` records the file that was read; it is
    /// `None` when no file was found and defaults were used.
    ///
    /// # Errors
    /// This function will return an error if:
    /// - The file given with `--config` cannot be read or parsed
    /// - A file found in the search path cannot be parsed
    /// - The polling interval is zero
    pub fn load(cli: &Cli) -> Result<Self> {
        let path = match &cli.config {
            Some(path) => Some(path.clone()),
            None => first_existing(Self::search_paths()),
        };

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid TOML for this
    /// configuration.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path:?}"))?;

        let mut config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path:?}"))?;
        config.source = Some(path.to_path_buf());

        Ok(config)
    }

    /// Locations searched for a configuration file, in priority order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(format!("{APP_NAME}.toml")),
            PathBuf::from(format!(".{APP_NAME}")).join("config.toml"),
        ];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(format!(".{APP_NAME}.toml")));
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(APP_NAME).join("config.toml"));
        }
        paths
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(region) = &cli.region {
            self.region = Some(region.clone());
        }
        if let Some(interval) = cli.polling_interval_seconds {
            self.polling_interval_seconds = interval;
        }
        // Flags can only switch these on
        self.quiet |= cli.quiet;
        self.dry_run |= cli.dry_run;

        if let Some(url) = &cli.anchore_url {
            self.anchore.url = url.clone();
        }
        if let Some(user) = &cli.anchore_user {
            self.anchore.user = user.clone();
        }
        if let Some(password) = &cli.anchore_password {
            self.anchore.password = password.clone();
        }
        if let Some(account) = &cli.anchore_account {
            self.anchore.account = account.clone();
        }
    }

    fn validate(&self) -> Result<()> {
        if self.polling_interval_seconds == 0 {
            bail!("polling-interval-seconds must be greater than zero");
        }
        Ok(())
    }

    /// Resolves the log level from the config file and `-v` count.
    ///
    /// # Errors
    /// Returns an error if both `log.level` and `-v` are given.
    pub fn log_level(&self, verbosity: u8) -> Result<String> {
        match (&self.log.level, verbosity) {
            (Some(_), v) if v > 0 => {
                bail!("cannot explicitly set log level (log.level) and verbosity (-v) together")
            }
            (Some(level), _) => Ok(level.clone()),
            (None, 0 | 1) => Ok("info".to_string()),
            (None, _) => Ok("debug".to_string()),
        }
    }
}

/// Renders the configuration as TOML with the Anchore password redacted.
impl fmt::Display for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut redacted = self.clone();
        if !redacted.anchore.password.is_empty() {
            redacted.anchore.password = REDACTED.to_string();
        }
        let rendered = toml::to_string_pretty(&redacted).map_err(|_| fmt::Error)?;
        write!(f, "{rendered}")
    }
}

fn first_existing(candidates: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    candidates.into_iter().find(|path| path.is_file())
}
