//! Collection of ECS inventory and assembly of per-cluster reports.

pub mod ecs;
pub mod reconcile;
pub mod report;

#[cfg(test)]
pub mod mock_ecs;

/// Placeholder value for data Anchore requires but ECS could not provide.
pub const UNKNOWN: &str = "UNKNOWN";
