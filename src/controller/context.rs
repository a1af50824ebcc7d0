use crate::config::OperatorConfig;
use crate::controller::facts::{ClusterFacts, FactsError, KubeClusterFacts};
use crate::controller::route::RouteError;
use crate::server::SharedMetrics;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("{kind} missing namespace")]
    MissingNamespace { kind: &'static str },

    #[error("Failed to read cluster facts: {0}")]
    Facts(#[from] FactsError),

    #[error("Failed to translate Ingress into Routes: {0}")]
    Route(#[from] RouteError),
}

/// Shared state handed to both reconcilers
pub struct Context {
    pub client: kube::Client,
    pub facts: Arc<dyn ClusterFacts>,
    pub config: OperatorConfig,
    /// Source of condition `lastTransitionTime`s
    pub now: fn() -> DateTime<Utc>,
    /// When Some, reconciliation counts and durations are recorded
    pub metrics: Option<SharedMetrics>,
}

impl Context {
    pub fn new(client: kube::Client, config: OperatorConfig, metrics: Option<SharedMetrics>) -> Self {
        Context {
            facts: Arc::new(KubeClusterFacts::new(client.clone())),
            client,
            config,
            now: Utc::now,
            metrics,
        }
    }

    pub fn condition_time(&self) -> DateTime<Utc> {
        (self.now)()
    }

    /// Context pointed at an unreachable API server, for tests that never
    /// get as far as a request. Time is frozen at 2024-05-01T10:00:00Z.
    #[cfg(test)]
    #[allow(clippy::unwrap_used)]
    pub fn new_mock(facts: impl ClusterFacts + 'static, config: OperatorConfig) -> Self {
        let _ = rustls::crypto::ring::default_provider().install_default();

        let mut kube_config = kube::Config::new("https://localhost:8080".parse().unwrap());
        kube_config.default_namespace = "default".to_string();
        kube_config.accept_invalid_certs = true;
        let client = kube::Client::try_from(kube_config).unwrap();

        Context {
            client,
            facts: Arc::new(facts),
            config,
            now: || DateTime::from_timestamp(1_714_557_600, 0).unwrap_or_default(),
            metrics: None,
        }
    }
}
