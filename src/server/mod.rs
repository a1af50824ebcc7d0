//! Operator-side HTTP surface and process lifecycle
//!
//! Probes and metrics live on one plain HTTP port; shutdown is driven by
//! SIGTERM/SIGINT.

mod health;
pub mod metrics;
pub mod shutdown;

pub use health::{run_health_server, ReadinessState};
pub use metrics::{
    create_metrics, ControllerMetrics, SharedMetrics, CONTROLLER_INGRESS, CONTROLLER_SERVING,
};
pub use shutdown::{wait_for_signal, Shutdown};

#[cfg(test)]
#[path = "health_test.rs"]
mod health_tests;

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod shutdown_tests;
