//! Makes a report referentially complete before it is sent.
//!
//! Anchore rejects reports in which a container points at a task, or a task at a
//! service, that the report does not contain. ECS can produce such reports (a
//! service deleted while its tasks drain, a task stopped between list and
//! describe), so minimal placeholder entities are added here.

use crate::inventory::UNKNOWN;
use crate::reporter::{Report, Service, Task};
use std::collections::HashSet;
use tracing::warn;

/// Adds the services and tasks a report references but does not contain.
///
/// Rules, in order:
/// 1. Every non-empty task `service_arn` gets a matching service (ARN only).
/// 2. Every container `task_arn` gets a matching task with an `UNKNOWN`
///    task definition.
/// 3. If the report then has any service, tasks without a service are
///    assigned the `UNKNOWN` service, which is added once.
///
/// Applying this to its own output returns the same report.
pub fn ensure_referenced_objects_exist(mut report: Report) -> Report {
    let mut service_arns: HashSet<String> =
        report.services.iter().map(|s| s.arn.clone()).collect();
    let mut task_arns: HashSet<String> = report.tasks.iter().map(|t| t.arn.clone()).collect();

    let referenced_services: Vec<String> = report
        .tasks
        .iter()
        .map(|t| t.service_arn.clone())
        .filter(|arn| !arn.is_empty())
        .collect();
    for service_arn in referenced_services {
        if service_arns.insert(service_arn.clone()) {
            warn!(
                service = %service_arn,
                "Service referenced in task not present in report, adding minimal service to report"
            );
            report.services.push(Service {
                arn: service_arn,
                ..Service::default()
            });
        }
    }

    let referenced_tasks: Vec<String> =
        report.containers.iter().map(|c| c.task_arn.clone()).collect();
    for task_arn in referenced_tasks {
        if task_arns.insert(task_arn.clone()) {
            warn!(
                task = %task_arn,
                "Task referenced in container not present in report, adding minimal task to report"
            );
            // task_definition_arn is required by Anchore
            report.tasks.push(Task {
                arn: task_arn,
                task_def_arn: UNKNOWN.to_string(),
                ..Task::default()
            });
        }
    }

    if !report.services.is_empty() {
        let mut standalone = false;
        for task in report.tasks.iter_mut().filter(|t| t.service_arn.is_empty()) {
            task.service_arn = UNKNOWN.to_string();
            standalone = true;
        }
        if standalone && !service_arns.contains(UNKNOWN) {
            report.services.push(Service {
                arn: UNKNOWN.to_string(),
                ..Service::default()
            });
        }
    }

    report
}
