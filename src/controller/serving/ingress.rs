use crate::crd::serving::{BackendConfig, IngressConfigs, KnativeServingSpec, ServiceType};
use tracing::debug;

use super::defaults::NETWORK_SECTION;
use super::monitoring::{BACKEND_DISABLED, OBSERVABILITY_BACKEND_KEY, OBSERVABILITY_SECTION};

pub const INGRESS_CLASS_KEY: &str = "ingress.class";

/// The ingress implementations the operator can install
///
/// Exactly one is active per installation. The wire format carries an
/// `enabled` flag per backend; `select_backend` is the only place those flags
/// are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngressBackend {
    /// Mesh-routed; brings its own telemetry path
    Istio,
    /// Reference backend, used whenever nothing else is enabled
    Kourier,
    Contour,
}

impl IngressBackend {
    /// Declaration order, which is also the precedence order (last wins)
    pub const ALL: [IngressBackend; 3] = [
        IngressBackend::Istio,
        IngressBackend::Kourier,
        IngressBackend::Contour,
    ];

    pub const REFERENCE: IngressBackend = IngressBackend::Kourier;

    pub fn name(&self) -> &'static str {
        match self {
            IngressBackend::Istio => "istio",
            IngressBackend::Kourier => "kourier",
            IngressBackend::Contour => "contour",
        }
    }

    /// Value of the network section's ingress class key for this backend
    pub fn ingress_class(&self) -> &'static str {
        match self {
            IngressBackend::Istio => "istio.ingress.networking.knative.dev",
            IngressBackend::Kourier => "kourier.ingress.networking.knative.dev",
            IngressBackend::Contour => "contour.ingress.networking.knative.dev",
        }
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self, IngressBackend::Istio)
    }

    fn config(self, configs: &IngressConfigs) -> &BackendConfig {
        match self {
            IngressBackend::Istio => &configs.istio,
            IngressBackend::Kourier => &configs.kourier,
            IngressBackend::Contour => &configs.contour,
        }
    }

    fn config_mut(self, configs: &mut IngressConfigs) -> &mut BackendConfig {
        match self {
            IngressBackend::Istio => &mut configs.istio,
            IngressBackend::Kourier => &mut configs.kourier,
            IngressBackend::Contour => &mut configs.contour,
        }
    }
}

/// Pick the active backend
///
/// Multiple enabled backends are not rejected here: the last one in
/// declaration order wins. None enabled (or no ingress block at all) falls
/// back to the reference backend.
pub fn select_backend(configs: Option<&IngressConfigs>) -> IngressBackend {
    configs
        .and_then(|configs| {
            IngressBackend::ALL
                .into_iter()
                .rev()
                .find(|backend| backend.config(configs).enabled)
        })
        .unwrap_or(IngressBackend::REFERENCE)
}

/// Rewrite the ingress block so only `backend` is enabled
///
/// Non-selected backends keep their sub-settings. The selected backend's
/// exposure defaults to cluster-internal; an explicit choice is kept.
pub fn write_backend(spec: &mut KnativeServingSpec, backend: IngressBackend) {
    let configs = spec.ingress.get_or_insert_with(IngressConfigs::default);

    for candidate in IngressBackend::ALL {
        candidate.config_mut(configs).enabled = candidate == backend;
    }

    let selected = backend.config_mut(configs);
    selected.service_type.get_or_insert(ServiceType::ClusterIP);

    if backend.is_mesh() {
        spec.config
            .set(NETWORK_SECTION, INGRESS_CLASS_KEY, backend.ingress_class());
        spec.config
            .set(OBSERVABILITY_SECTION, OBSERVABILITY_BACKEND_KEY, BACKEND_DISABLED);
    } else {
        spec.config
            .set_if_absent(NETWORK_SECTION, INGRESS_CLASS_KEY, backend.ingress_class());
    }
}

/// Select and write back the active backend, returning it
pub fn resolve_ingress(spec: &mut KnativeServingSpec) -> IngressBackend {
    let backend = select_backend(spec.ingress.as_ref());
    debug!(backend = backend.name(), "Resolved ingress backend");
    write_backend(spec, backend);
    backend
}

#[cfg(test)]
#[path = "ingress_test.rs"]
mod tests;
