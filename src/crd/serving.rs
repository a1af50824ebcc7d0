use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// KnativeServing describes one installation of the serving platform
///
/// The operator fills in everything the user left out and reports
/// installation gates (platform version, install namespace) on the status.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "operator.knative.dev",
    version = "v1beta1",
    kind = "KnativeServing",
    namespaced,
    status = "KnativeServingStatus",
    printcolumn = r#"{"name":"Version", "type":"string", "jsonPath":".status.version"}"#,
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Reason", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].reason"}"#
)]
pub struct KnativeServingSpec {
    /// High-availability settings for the control plane deployments
    #[serde(rename = "high-availability", skip_serializing_if = "Option::is_none")]
    pub high_availability: Option<HighAvailability>,

    /// Certificates the controller trusts when talking to registries
    #[serde(rename = "controller-custom-certs", default)]
    pub controller_custom_certs: CustomCerts,

    /// Image registry overrides
    #[serde(default)]
    pub registry: Registry,

    /// Per-container resource requirement overrides
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceRequirementsOverride>,

    /// Configuration sections, rendered into one ConfigMap per section
    #[serde(default, skip_serializing_if = "ConfigMapData::is_empty")]
    pub config: ConfigMapData,

    /// Ingress backends; exactly one is active once resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress: Option<IngressConfigs>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct HighAvailability {
    /// Replicas for every HA-capable deployment
    #[serde(default)]
    pub replicas: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct CustomCerts {
    /// Kind of object holding the certificates: "ConfigMap" or "Secret"
    #[serde(rename = "type", default)]
    pub cert_type: String,

    /// Name of the object holding the certificates
    #[serde(default)]
    pub name: String,
}

impl CustomCerts {
    pub fn is_empty(&self) -> bool {
        self.cert_type.is_empty() && self.name.is_empty()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct Registry {
    /// Image used for any component without its own override
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default: String,

    /// Component (or container) name to image
    #[serde(rename = "override", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub override_: BTreeMap<String, String>,
}

impl Registry {
    pub fn image_for(&self, component: &str) -> Option<&str> {
        self.override_
            .get(component)
            .map(String::as_str)
            .or_else(|| (!self.default.is_empty()).then_some(self.default.as_str()))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct ResourceRequirementsOverride {
    /// Name of the container the override applies to
    pub container: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests: Option<BTreeMap<String, Quantity>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<BTreeMap<String, Quantity>>,
}

/// Two-level configuration mapping: section -> key -> value
///
/// Writers either `set_if_absent` (never overriding explicit user input) or
/// `set` (operator-forced values). Ordered maps keep the serialized form stable
/// across passes.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(transparent)]
pub struct ConfigMapData(pub BTreeMap<String, BTreeMap<String, String>>);

impl ConfigMapData {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.0
            .get(section)
            .and_then(|s| s.get(key))
            .map(String::as_str)
    }

    pub fn contains(&self, section: &str, key: &str) -> bool {
        self.get(section, key).is_some()
    }

    /// Write `value` unless the key is already present. Returns true if written.
    pub fn set_if_absent(&mut self, section: &str, key: &str, value: &str) -> bool {
        let entries = self.0.entry(section.to_string()).or_default();
        if entries.contains_key(key) {
            return false;
        }
        entries.insert(key.to_string(), value.to_string());
        true
    }

    /// Write `value`, replacing whatever was there
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.0
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }
}

/// Ingress backends, in declaration order
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct IngressConfigs {
    #[serde(default)]
    pub istio: BackendConfig,

    #[serde(default)]
    pub kourier: BackendConfig,

    #[serde(default)]
    pub contour: BackendConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct BackendConfig {
    #[serde(default)]
    pub enabled: bool,

    /// How the backend's gateway service is exposed
    #[serde(rename = "service-type", skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
pub enum ServiceType {
    ClusterIP,
    LoadBalancer,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct KnativeServingStatus {
    /// Installed platform version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(rename = "observedGeneration", skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// A status condition in the usual Kubernetes shape
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,

    /// "True", "False" or "Unknown"
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// RFC3339 timestamp of the last status flip
    #[serde(rename = "lastTransitionTime", skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

pub const CONDITION_READY: &str = "Ready";
pub const CONDITION_INSTALL_SUCCEEDED: &str = "InstallSucceeded";
pub const CONDITION_DEPENDENCIES_INSTALLED: &str = "DependenciesInstalled";

impl KnativeServingStatus {
    pub fn condition(&self, type_: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }

    pub fn is_false(&self, type_: &str) -> bool {
        self.condition(type_).is_some_and(|c| c.status == "False")
    }

    /// Upsert a condition. The transition time only moves when the status flips.
    pub fn set_condition(
        &mut self,
        type_: &str,
        status: &str,
        reason: Option<&str>,
        message: Option<String>,
        now: DateTime<Utc>,
    ) {
        match self.conditions.iter_mut().find(|c| c.type_ == type_) {
            Some(existing) => {
                if existing.status != status {
                    existing.last_transition_time = Some(now.to_rfc3339());
                }
                existing.status = status.to_string();
                existing.reason = reason.map(str::to_string);
                existing.message = message;
            }
            None => self.conditions.push(Condition {
                type_: type_.to_string(),
                status: status.to_string(),
                reason: reason.map(str::to_string),
                message,
                last_transition_time: Some(now.to_rfc3339()),
            }),
        }
    }

    pub fn remove_condition(&mut self, type_: &str) {
        self.conditions.retain(|c| c.type_ != type_);
    }

    /// Terminal failure: the installation cannot proceed as specified
    pub fn mark_install_failed(&mut self, reason: &str, message: String, now: DateTime<Utc>) {
        self.set_condition(
            CONDITION_INSTALL_SUCCEEDED,
            "False",
            Some(reason),
            Some(message.clone()),
            now,
        );
        self.set_condition(CONDITION_READY, "False", Some(reason), Some(message), now);
    }

    /// The cluster does not provide what the installation depends on
    pub fn mark_dependency_missing(&mut self, reason: &str, message: String, now: DateTime<Utc>) {
        self.set_condition(
            CONDITION_DEPENDENCIES_INSTALLED,
            "False",
            Some(reason),
            Some(message.clone()),
            now,
        );
        self.set_condition(CONDITION_READY, "False", Some(reason), Some(message), now);
    }

    pub fn mark_dependencies_installed(&mut self, now: DateTime<Utc>) {
        self.set_condition(CONDITION_DEPENDENCIES_INSTALLED, "True", None, None, now);
    }
}

#[cfg(test)]
#[path = "serving_test.rs"]
mod tests;
