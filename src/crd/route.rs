//! OpenShift Route, the object this operator derives from each Ingress host

use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "route.openshift.io",
    version = "v1",
    kind = "Route",
    namespaced,
    status = "RouteStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    pub host: String,

    pub to: RouteTargetReference,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<RoutePort>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TLSConfig>,

    #[serde(default)]
    pub wildcard_policy: WildcardPolicy,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct RouteTargetReference {
    pub kind: String,

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoutePort {
    pub target_port: IntOrString,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TLSConfig {
    pub termination: TLSTermination,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure_edge_termination_policy: Option<InsecureEdgeTerminationPolicy>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TLSTermination {
    /// TLS ends at the router
    Edge,
    /// TLS is forwarded untouched to the backend
    Passthrough,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
pub enum InsecureEdgeTerminationPolicy {
    Allow,
    Redirect,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, JsonSchema)]
pub enum WildcardPolicy {
    #[default]
    None,
    Subdomain,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct RouteStatus {
    #[serde(default)]
    pub ingress: Vec<RouteIngress>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteIngress {
    #[serde(default)]
    pub host: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub router_name: Option<String>,
}

impl Route {
    /// The externally reachable host admitted by a router, if any
    pub fn admitted_host(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.ingress.iter().find(|i| !i.host.is_empty()))
            .map(|i| i.host.as_str())
    }
}
