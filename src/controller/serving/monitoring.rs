use crate::crd::serving::ConfigMapData;

pub const OBSERVABILITY_SECTION: &str = "observability";
pub const OBSERVABILITY_BACKEND_KEY: &str = "metrics.backend-destination";

/// Backend value meaning "no metrics exporter"
pub const BACKEND_DISABLED: &str = "none";

/// Label on the installation namespace that switches cluster monitoring on/off
pub const ENABLE_MONITORING_LABEL: &str = "serving.knative.openshift.io/enable-monitoring";

/// What the monitoring policy wants the world to look like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitoringDecision {
    /// Value for the namespace enablement label
    pub enabled: bool,
    /// Whether the disabled sentinel has to be written into the backend key
    pub write_disabled_backend: bool,
}

impl MonitoringDecision {
    pub fn label_value(&self) -> &'static str {
        if self.enabled {
            "true"
        } else {
            "false"
        }
    }
}

/// Decide monitoring state from the explicit backend and the environment toggle
///
/// Precedence:
/// 1. an explicit backend wins; enabled unless it is the disabled sentinel
/// 2. otherwise an explicit toggle wins; "off" is written back as the sentinel
/// 3. otherwise monitoring is on and the backend stays unset
pub fn decide(config: &ConfigMapData, toggle: Option<bool>) -> MonitoringDecision {
    if let Some(backend) = config.get(OBSERVABILITY_SECTION, OBSERVABILITY_BACKEND_KEY) {
        return MonitoringDecision {
            enabled: backend != BACKEND_DISABLED,
            write_disabled_backend: false,
        };
    }

    match toggle {
        Some(enabled) => MonitoringDecision {
            enabled,
            write_disabled_backend: !enabled,
        },
        None => MonitoringDecision {
            enabled: true,
            write_disabled_backend: false,
        },
    }
}

/// Apply the decision to the spec and return it for the namespace label write
pub fn apply_monitoring(config: &mut ConfigMapData, toggle: Option<bool>) -> MonitoringDecision {
    let decision = decide(config, toggle);
    if decision.write_disabled_backend {
        config.set(OBSERVABILITY_SECTION, OBSERVABILITY_BACKEND_KEY, BACKEND_DISABLED);
    }
    decision
}
