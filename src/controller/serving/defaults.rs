use crate::crd::serving::{
    CustomCerts, HighAvailability, KnativeServingSpec, ResourceRequirementsOverride,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

pub const DEFAULT_HA_REPLICAS: i32 = 2;

pub const DEFAULT_CERTS_TYPE: &str = "ConfigMap";
pub const DEFAULT_CERTS_NAME: &str = "config-service-ca";

/// Registry key whose image applies to every component without its own entry
pub const DEFAULT_IMAGE_KEY: &str = "default";
pub const QUEUE_PROXY_IMAGE_KEY: &str = "queue-proxy";

pub const DEPLOYMENT_SECTION: &str = "deployment";
pub const QUEUE_SIDECAR_IMAGE_KEY: &str = "queueSidecarImage";

pub const DOMAIN_SECTION: &str = "domain";

pub const NETWORK_SECTION: &str = "network";
pub const DOMAIN_TEMPLATE_KEY: &str = "domainTemplate";
pub const DEFAULT_DOMAIN_TEMPLATE: &str = "{{.Name}}-{{.Namespace}}.{{.Domain}}";
pub const AUTOCREATE_DOMAIN_CLAIMS_KEY: &str = "autocreateClusterDomainClaims";
pub const DEFAULT_EXTERNAL_SCHEME_KEY: &str = "defaultExternalScheme";

const WEBHOOK_CONTAINER: &str = "webhook";
const WEBHOOK_MEMORY_LIMIT: &str = "1024Mi";

/// HA replicas: zero or unset becomes 2, anything explicit is kept
pub fn default_high_availability(spec: &mut KnativeServingSpec) {
    let ha = spec
        .high_availability
        .get_or_insert_with(HighAvailability::default);
    if ha.replicas == 0 {
        ha.replicas = DEFAULT_HA_REPLICAS;
    }
}

/// Trust the cluster's service CA unless the user picked certificates
pub fn default_custom_certs(spec: &mut KnativeServingSpec) {
    if spec.controller_custom_certs.is_empty() {
        spec.controller_custom_certs = CustomCerts {
            cert_type: DEFAULT_CERTS_TYPE.to_string(),
            name: DEFAULT_CERTS_NAME.to_string(),
        };
    }
}

/// Copy operator-provided images into the registry block
///
/// Operator images win over user entries with the same key. User keys the
/// operator does not know about are kept; deployments simply never look them up.
pub fn apply_image_overrides(spec: &mut KnativeServingSpec, images: &BTreeMap<String, String>) {
    for (component, image) in images {
        spec.registry
            .override_
            .insert(component.clone(), image.clone());
    }

    if let Some(default_image) = images.get(DEFAULT_IMAGE_KEY) {
        spec.registry.default = default_image.clone();
    }

    if let Some(queue_image) = images.get(QUEUE_PROXY_IMAGE_KEY) {
        spec.config
            .set_if_absent(DEPLOYMENT_SECTION, QUEUE_SIDECAR_IMAGE_KEY, queue_image);
    }
}

/// Collapse per-container overrides and add operator defaults
///
/// Later entries for the same container replace earlier ones in place, so the
/// list keeps the position of each container's first appearance.
pub fn normalize_resources(spec: &mut KnativeServingSpec) {
    let mut merged: Vec<ResourceRequirementsOverride> = Vec::with_capacity(spec.resources.len());
    for entry in spec.resources.drain(..) {
        match merged.iter_mut().find(|e| e.container == entry.container) {
            Some(existing) => *existing = entry,
            None => merged.push(entry),
        }
    }

    if !merged.iter().any(|e| e.container == WEBHOOK_CONTAINER) {
        merged.push(ResourceRequirementsOverride {
            container: WEBHOOK_CONTAINER.to_string(),
            requests: None,
            limits: Some(BTreeMap::from([(
                "memory".to_string(),
                Quantity(WEBHOOK_MEMORY_LIMIT.to_string()),
            )])),
        });
    }

    spec.resources = merged;
}

/// Network and domain defaults, none of which override explicit settings
pub fn default_network_config(spec: &mut KnativeServingSpec, cluster_domain: Option<&str>) {
    let config = &mut spec.config;
    config.set_if_absent(NETWORK_SECTION, DOMAIN_TEMPLATE_KEY, DEFAULT_DOMAIN_TEMPLATE);
    config.set_if_absent(NETWORK_SECTION, AUTOCREATE_DOMAIN_CLAIMS_KEY, "true");
    config.set_if_absent(NETWORK_SECTION, DEFAULT_EXTERNAL_SCHEME_KEY, "https");

    if let Some(domain) = cluster_domain.filter(|d| !d.is_empty()) {
        config.set_if_absent(DOMAIN_SECTION, domain, "");
    }
}

/// Run every defaulting rule; the rules touch disjoint fields so order is irrelevant
pub fn apply_defaults(
    spec: &mut KnativeServingSpec,
    images: &BTreeMap<String, String>,
    cluster_domain: Option<&str>,
) {
    default_high_availability(spec);
    default_custom_certs(spec);
    apply_image_overrides(spec, images);
    normalize_resources(spec);
    default_network_config(spec, cluster_domain);
}

#[cfg(test)]
#[path = "defaults_test.rs"]
mod tests;
