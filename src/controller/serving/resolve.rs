use crate::config::OperatorConfig;
use crate::crd::serving::{
    KnativeServing, KnativeServingSpec, KnativeServingStatus, CONDITION_DEPENDENCIES_INSTALLED,
    CONDITION_READY,
};
use chrono::{DateTime, Utc};
use kube::ResourceExt;
use tracing::{debug, warn};

use super::defaults::apply_defaults;
use super::ingress::{resolve_ingress, IngressBackend};
use super::logging::apply_logging_route;
use super::monitoring::{apply_monitoring, MonitoringDecision};
use super::namespace::{check_namespace, record_namespace_check, NAMESPACE_MISMATCH_REASON};
use super::version::check_minimum_version;

/// Reasons this pass records; anything else on the status belongs to someone else
const GATE_REASONS: [&str; 3] = ["VersionTooLow", "VersionUnparsable", NAMESPACE_MISMATCH_REASON];

/// External facts gathered before a pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedFacts {
    /// Platform version as reported by the API server, e.g. `v1.28.3+k3s1`
    pub kubernetes_version: String,

    /// Base domain of the cluster's default ingress, if the cluster has one
    pub cluster_domain: Option<String>,

    /// Admitted host of the logging route, if the logging stack is installed
    pub logging_host: Option<String>,
}

/// Result of one pass over a KnativeServing
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub spec: KnativeServingSpec,
    pub status: KnativeServingStatus,
    pub ingress_backend: IngressBackend,
    pub monitoring: MonitoringDecision,
}

impl Resolution {
    /// True if a gate failed and the installation should not proceed
    pub fn is_blocked(&self) -> bool {
        self.status.conditions.iter().any(|c| {
            c.status == "False"
                && c.reason
                    .as_deref()
                    .is_some_and(|r| GATE_REASONS.contains(&r))
        })
    }
}

/// Compute the fully resolved spec and status for `serving`
///
/// Pure: the same resource, facts and config always give the same result.
/// Gate failures land on the status and never stop defaulting, so a failed
/// installation still shows a coherent desired state.
pub fn resolve_serving(
    serving: &KnativeServing,
    facts: &ObservedFacts,
    config: &OperatorConfig,
    now: DateTime<Utc>,
) -> Resolution {
    let name = serving.name_any();
    let mut spec = serving.spec.clone();
    let mut status = serving.status.clone().unwrap_or_default();

    let mut gate_failed = false;

    match check_minimum_version(&facts.kubernetes_version, &config.minimum_kubernetes_version) {
        Ok(()) => {
            let failed_here = status
                .condition(CONDITION_DEPENDENCIES_INSTALLED)
                .is_some_and(|c| {
                    c.status == "False"
                        && c.reason
                            .as_deref()
                            .is_some_and(|r| GATE_REASONS.contains(&r))
                });
            if failed_here {
                status.mark_dependencies_installed(now);
            }
        }
        Err(e) => {
            warn!(serving = ?name, error = %e, "Kubernetes version check failed");
            status.mark_dependency_missing(e.reason(), e.to_string(), now);
            gate_failed = true;
        }
    }

    let namespace_check = check_namespace(
        serving.namespace().as_deref(),
        config.required_namespace.as_deref(),
    );
    if let Some(message) = namespace_check.message() {
        warn!(serving = ?name, %message, "KnativeServing is in the wrong namespace");
        gate_failed = true;
    }
    record_namespace_check(&mut status, &namespace_check, now);

    if !gate_failed {
        let ready_from_gate = status.condition(CONDITION_READY).is_some_and(|c| {
            c.reason
                .as_deref()
                .is_some_and(|r| GATE_REASONS.contains(&r))
        });
        if ready_from_gate {
            status.remove_condition(CONDITION_READY);
        }
    }

    apply_defaults(
        &mut spec,
        &config.image_overrides,
        facts.cluster_domain.as_deref(),
    );
    let ingress_backend = resolve_ingress(&mut spec);
    apply_logging_route(&mut spec.config, facts.logging_host.as_deref());
    let monitoring = apply_monitoring(&mut spec.config, config.monitoring_toggle);

    if let Some(generation) = serving.metadata.generation {
        status.observed_generation = Some(generation);
    }

    debug!(
        serving = ?name,
        ingress = ingress_backend.name(),
        monitoring = monitoring.enabled,
        "Resolved KnativeServing"
    );

    Resolution {
        spec,
        status,
        ingress_backend,
        monitoring,
    }
}

#[cfg(test)]
#[path = "resolve_test.rs"]
mod tests;
