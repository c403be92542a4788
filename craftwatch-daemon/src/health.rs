//! Aggregated health check reporting.
//!
//! Combines each module's `health_check()` result into a unified
//! [`DaemonHealth`] report. The overall daemon status is the worst
//! status among all modules.
//!
//! # Aggregation Rule
//!
//! - All Healthy -> Healthy
//! - Any Degraded, none Unhealthy -> Degraded(reason)
//! - Any Unhealthy -> Unhealthy(reason)

use serde::Serialize;

use craftwatch_core::pipeline::HealthStatus;

/// Aggregated health report for the entire daemon.
#[derive(Debug, Clone, Serialize)]
pub struct DaemonHealth {
    /// Overall daemon health status (worst of all modules).
    pub status: HealthStatus,
    /// Daemon uptime in seconds since start.
    pub uptime_secs: u64,
    /// Per-module health reports.
    pub modules: Vec<ModuleHealth>,
}

/// Health status for a single module.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleHealth {
    /// Module name (e.g., "watcher", "notify").
    pub name: String,
    /// Current health status of the module.
    pub status: HealthStatus,
}

/// Aggregate multiple module health statuses into a single status.
///
/// Returns the worst status found: Unhealthy > Degraded > Healthy.
pub fn aggregate_status(modules: &[ModuleHealth]) -> HealthStatus {
    let mut worst = HealthStatus::Healthy;
    let mut reasons = Vec::new();

    for module in modules {
        match &module.status {
            HealthStatus::Healthy => {}
            HealthStatus::Degraded(reason) => {
                if !worst.is_unhealthy() {
                    reasons.push(format!("{}: {}", module.name, reason));
                    worst = HealthStatus::Degraded(String::new());
                }
            }
            HealthStatus::Unhealthy(reason) => {
                reasons.push(format!("{}: {}", module.name, reason));
                worst = HealthStatus::Unhealthy(String::new());
            }
        }
    }

    match worst {
        HealthStatus::Healthy => HealthStatus::Healthy,
        HealthStatus::Degraded(_) => HealthStatus::Degraded(reasons.join("; ")),
        HealthStatus::Unhealthy(_) => HealthStatus::Unhealthy(reasons.join("; ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str, status: HealthStatus) -> ModuleHealth {
        ModuleHealth {
            name: name.to_owned(),
            status,
        }
    }

    #[test]
    fn all_healthy_aggregates_healthy() {
        let modules = vec![
            module("watcher", HealthStatus::Healthy),
            module("notify", HealthStatus::Healthy),
        ];
        assert_eq!(aggregate_status(&modules), HealthStatus::Healthy);
    }

    #[test]
    fn degraded_wins_over_healthy() {
        let modules = vec![
            module("watcher", HealthStatus::Healthy),
            module("notify", HealthStatus::Degraded("no sinks".to_owned())),
        ];
        let status = aggregate_status(&modules);
        assert!(matches!(status, HealthStatus::Degraded(_)));
        if let HealthStatus::Degraded(reason) = status {
            assert!(reason.contains("notify"));
        }
    }

    #[test]
    fn unhealthy_wins_over_degraded() {
        let modules = vec![
            module("watcher", HealthStatus::Unhealthy("stopped".to_owned())),
            module("notify", HealthStatus::Degraded("no sinks".to_owned())),
        ];
        let status = aggregate_status(&modules);
        assert!(status.is_unhealthy());
        if let HealthStatus::Unhealthy(reason) = status {
            assert!(reason.contains("watcher: stopped"));
        }
    }

    #[test]
    fn empty_modules_are_healthy() {
        assert_eq!(aggregate_status(&[]), HealthStatus::Healthy);
    }
}
