//! Prometheus metrics for the two reconcilers
//!
//! Each operator instance owns its own `Registry` so tests can create as many
//! as they like without colliding on the default global registry.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

pub const CONTROLLER_SERVING: &str = "knativeserving";
pub const CONTROLLER_INGRESS: &str = "ingress";

pub struct ControllerMetrics {
    registry: Registry,
    reconciliations: IntCounterVec,
    duration: HistogramVec,
    routes: IntGaugeVec,
}

pub type SharedMetrics = Arc<ControllerMetrics>;

impl ControllerMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let reconciliations = IntCounterVec::new(
            Opts::new(
                "serverless_operator_reconciliations_total",
                "Reconciliation passes by controller and result",
            ),
            &["controller", "result"],
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new(
                "serverless_operator_reconciliation_duration_seconds",
                "Duration of successful reconciliation passes",
            )
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["controller"],
        )?;
        let routes = IntGaugeVec::new(
            Opts::new(
                "serverless_operator_routes",
                "Routes currently derived from an Ingress",
            ),
            &["ingress_namespace", "ingress"],
        )?;

        registry.register(Box::new(reconciliations.clone()))?;
        registry.register(Box::new(duration.clone()))?;
        registry.register(Box::new(routes.clone()))?;

        Ok(Self {
            registry,
            reconciliations,
            duration,
            routes,
        })
    }

    pub fn record_reconciliation_success(&self, controller: &str, duration_secs: f64) {
        self.reconciliations
            .with_label_values(&[controller, "success"])
            .inc();
        self.duration
            .with_label_values(&[controller])
            .observe(duration_secs);
    }

    pub fn record_reconciliation_error(&self, controller: &str) {
        self.reconciliations
            .with_label_values(&[controller, "error"])
            .inc();
    }

    pub fn set_route_count(&self, namespace: &str, ingress: &str, count: usize) {
        self.routes
            .with_label_values(&[namespace, ingress])
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Forget a deleted Ingress so its last count stops being exported
    pub fn remove_route_count(&self, namespace: &str, ingress: &str) {
        // Err only means the series was never set
        let _ = self.routes.remove_label_values(&[namespace, ingress]);
    }

    /// Render all metrics in the Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

pub fn create_metrics() -> Result<SharedMetrics, prometheus::Error> {
    Ok(Arc::new(ControllerMetrics::new()?))
}
