//! Command line definition.
//!
//! Every setting that can appear in the configuration file can also be given on
//! the command line or through an `ANCHORE_ECS_INVENTORY_*` environment variable;
//! see [`crate::config::AppConfig::load`] for how they are combined.

use clap::{ArgAction, Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;

/// How often the inventory is collected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Collect and report once, then exit
    #[default]
    Adhoc,
    /// Collect and report on a fixed interval until stopped
    Periodic,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Adhoc => write!(f, "adhoc"),
            Mode::Periodic => write!(f, "periodic"),
        }
    }
}

#[derive(Parser, Debug, Default)]
#[command(
    name = "anchore-ecs-inventory",
    version,
    about = "Reports the container images running in Amazon ECS to Anchore"
)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "PATH", env = "ANCHORE_ECS_INVENTORY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Execution mode
    #[arg(
        short,
        long,
        value_enum,
        default_value_t = Mode::Adhoc,
        env = "ANCHORE_ECS_INVENTORY_MODE"
    )]
    pub mode: Mode,

    /// Seconds between inventory collections in periodic mode
    #[arg(
        short,
        long,
        value_name = "SECONDS",
        env = "ANCHORE_ECS_INVENTORY_POLLING_INTERVAL_SECONDS"
    )]
    pub polling_interval_seconds: Option<u64>,

    /// AWS region to inventory
    #[arg(short, long, env = "ANCHORE_ECS_INVENTORY_REGION")]
    pub region: Option<String>,

    /// Do not print the inventory report to stdout
    #[arg(short, long, env = "ANCHORE_ECS_INVENTORY_QUIET")]
    pub quiet: bool,

    /// Do not send the inventory report to Anchore
    #[arg(short, long, env = "ANCHORE_ECS_INVENTORY_DRY_RUN")]
    pub dry_run: bool,

    /// Anchore API base URL
    #[arg(long, value_name = "URL", env = "ANCHORE_ECS_INVENTORY_ANCHORE_URL")]
    pub anchore_url: Option<String>,

    /// Anchore user
    #[arg(long, value_name = "USER", env = "ANCHORE_ECS_INVENTORY_ANCHORE_USER")]
    pub anchore_user: Option<String>,

    /// Anchore password
    #[arg(
        long,
        value_name = "PASSWORD",
        env = "ANCHORE_ECS_INVENTORY_ANCHORE_PASSWORD",
        hide_env_values = true
    )]
    pub anchore_password: Option<String>,

    /// Anchore account the inventory belongs to
    #[arg(long, value_name = "ACCOUNT", env = "ANCHORE_ECS_INVENTORY_ANCHORE_ACCOUNT")]
    pub anchore_account: Option<String>,
}
