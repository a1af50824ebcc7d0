//! Knative networking Ingress (read-only for this operator)
//!
//! Only the fields the route translator looks at are modelled; anything else
//! on the wire is ignored during deserialization.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "networking.internal.knative.dev",
    version = "v1alpha1",
    kind = "Ingress",
    namespaced,
    status = "IngressStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct IngressSpec {
    /// TLS settings; any entry switches routes to passthrough
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tls: Vec<IngressTLS>,

    /// Routing rules, processed in order
    #[serde(default)]
    pub rules: Vec<IngressRule>,

    /// Whether plain HTTP is served or redirected to HTTPS
    #[serde(default)]
    pub http_option: HTTPOption,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngressTLS {
    #[serde(default)]
    pub hosts: Vec<String>,

    pub secret_name: String,

    pub secret_namespace: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct IngressRule {
    #[serde(default)]
    pub hosts: Vec<String>,

    #[serde(default)]
    pub visibility: IngressVisibility,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, JsonSchema)]
pub enum IngressVisibility {
    /// Reachable from outside the cluster
    #[default]
    ExternalIP,
    /// Only resolvable inside the cluster
    ClusterLocal,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, JsonSchema)]
pub enum HTTPOption {
    #[default]
    Enabled,
    Redirected,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngressStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_load_balancer: Option<LoadBalancerStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_load_balancer: Option<LoadBalancerStatus>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct LoadBalancerStatus {
    #[serde(default)]
    pub ingress: Vec<LoadBalancerIngressStatus>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerIngressStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// In-cluster name of the data plane service, e.g.
    /// `kourier.knative-serving-ingress.svc.cluster.local`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_internal: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub mesh_only: bool,
}
