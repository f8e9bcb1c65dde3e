//! Inventory report model and delivery to Anchore.

pub mod client;
pub mod report;

pub use client::{ApiPath, ReportClient};
pub use report::{Container, Report, Service, Task, Tags};
