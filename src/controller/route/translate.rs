use crate::crd::ingress::{HTTPOption, Ingress, IngressRule, IngressVisibility};
use crate::crd::route::{
    InsecureEdgeTerminationPolicy, Route, RoutePort, RouteSpec, RouteTargetReference, TLSConfig,
    TLSTermination, WildcardPolicy,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ObjectMeta;
use kube::ResourceExt;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use thiserror::Error;

pub const TIMEOUT_ANNOTATION: &str = "haproxy.router.openshift.io/timeout";
pub const DISABLE_ROUTE_ANNOTATION: &str = "serving.knative.openshift.io/disableRoute";
pub const ENABLE_PASSTHROUGH_ANNOTATION: &str = "serving.knative.openshift.io/enablePassthrough";
/// Older ingresses carried the HTTP option as an annotation instead of a spec field
pub const HTTP_OPTION_ANNOTATION: &str = "networking.knative.dev/http-option";

pub const INGRESS_LABEL: &str = "networking.internal.knative.dev/ingress";
pub const INGRESS_NAME_LABEL: &str = "serving.knative.openshift.io/ingressName";
pub const INGRESS_NAMESPACE_LABEL: &str = "serving.knative.openshift.io/ingressNamespace";

/// Plain HTTP (h2c-capable) port on the ingress gateway service
pub const HTTP_PORT: &str = "http2";
pub const HTTPS_PORT: &str = "https";

/// Matches the platform's maximum revision timeout, so the router never cuts
/// a request the revision would still serve.
pub const DEFAULT_TIMEOUT: &str = "600s";

const ROUTE_WEIGHT: i32 = 100;
const HOST_HASH_LEN: usize = 6;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("unable to find Ingress LoadBalancer with DomainInternal set")]
    NoValidLoadBalancerDomain,

    #[error("incorrect HTTPOption annotation: {0}")]
    IncorrectHttpOptionAnnotation(String),

    #[error("Ingress missing {0}")]
    MissingMetadata(&'static str),
}

/// Translate an Ingress into Routes, one per externally routable host
///
/// All or nothing: the first failing host aborts the whole translation and
/// no partial list is returned.
pub fn make_routes(ingress: &Ingress) -> Result<Vec<Route>, RouteError> {
    let mut routes = Vec::new();

    for rule in &ingress.spec.rules {
        if rule.visibility == IngressVisibility::ClusterLocal {
            continue;
        }
        for host in &rule.hosts {
            if !is_external_host(host) {
                continue;
            }
            if let Some(route) = make_route(ingress, host, rule)? {
                routes.push(route);
            }
        }
    }

    Ok(routes)
}

/// Hosts like `svc.ns.svc.cluster.local` only resolve inside the cluster
///
/// A host is routable if it has exactly two labels, or more than two with a
/// third label other than `svc`.
pub fn is_external_host(host: &str) -> bool {
    let labels: Vec<&str> = host.split('.').collect();
    labels.len() == 2 || (labels.len() > 2 && labels[2] != "svc")
}

/// Parse `service.namespace.svc...` into `(service, namespace)`
pub fn parse_internal_domain(domain: &str) -> Option<(&str, &str)> {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() > 2 && labels[2] == "svc" && !labels[0].is_empty() && !labels[1].is_empty() {
        Some((labels[0], labels[1]))
    } else {
        None
    }
}

/// `route-<uid>-<first 6 hex chars of sha256(host)>`
pub fn route_name(uid: &str, host: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(host.as_bytes()));
    format!("route-{}-{}", uid, &digest[..HOST_HASH_LEN])
}

/// Find the backing service of the ingress's public load balancer
fn target_service(ingress: &Ingress) -> Result<(String, String), RouteError> {
    ingress
        .status
        .as_ref()
        .and_then(|s| s.public_load_balancer.as_ref())
        .into_iter()
        .flat_map(|lb| lb.ingress.iter())
        .filter_map(|entry| entry.domain_internal.as_deref())
        .find_map(parse_internal_domain)
        .map(|(service, namespace)| (service.to_string(), namespace.to_string()))
        .ok_or(RouteError::NoValidLoadBalancerDomain)
}

/// Edge policy from the spec field, overridden by the legacy annotation if set
fn edge_policy(
    http_option: HTTPOption,
    annotations: &BTreeMap<String, String>,
) -> Result<InsecureEdgeTerminationPolicy, RouteError> {
    let mut policy = match http_option {
        HTTPOption::Enabled => InsecureEdgeTerminationPolicy::Allow,
        HTTPOption::Redirected => InsecureEdgeTerminationPolicy::Redirect,
    };

    if let Some(value) = annotations
        .get(HTTP_OPTION_ANNOTATION)
        .filter(|v| !v.is_empty())
    {
        policy = match value.to_lowercase().as_str() {
            "enabled" => InsecureEdgeTerminationPolicy::Allow,
            "redirected" => InsecureEdgeTerminationPolicy::Redirect,
            _ => return Err(RouteError::IncorrectHttpOptionAnnotation(value.clone())),
        };
    }

    Ok(policy)
}

fn make_route(ingress: &Ingress, host: &str, rule: &IngressRule) -> Result<Option<Route>, RouteError> {
    let mut annotations = ingress.annotations().clone();

    if rule.visibility == IngressVisibility::ClusterLocal
        || annotations.contains_key(DISABLE_ROUTE_ANNOTATION)
    {
        return Ok(None);
    }

    annotations.insert(TIMEOUT_ANNOTATION.to_string(), DEFAULT_TIMEOUT.to_string());

    let ingress_name = ingress
        .metadata
        .name
        .as_deref()
        .ok_or(RouteError::MissingMetadata("name"))?;
    let ingress_namespace = ingress
        .metadata
        .namespace
        .as_deref()
        .ok_or(RouteError::MissingMetadata("namespace"))?;
    let uid = ingress
        .metadata
        .uid
        .as_deref()
        .ok_or(RouteError::MissingMetadata("uid"))?;

    let mut labels = ingress.labels().clone();
    labels.insert(INGRESS_LABEL.to_string(), ingress_name.to_string());
    labels.insert(INGRESS_NAME_LABEL.to_string(), ingress_name.to_string());
    labels.insert(
        INGRESS_NAMESPACE_LABEL.to_string(),
        ingress_namespace.to_string(),
    );

    let (service_name, service_namespace) = target_service(ingress)?;

    let mut target_port = HTTP_PORT;
    let mut termination = TLSTermination::Edge;
    let mut policy = edge_policy(ingress.spec.http_option, &annotations)?;

    // Passthrough beats whatever the HTTP option asked for
    if annotations.contains_key(ENABLE_PASSTHROUGH_ANNOTATION) || !ingress.spec.tls.is_empty() {
        target_port = HTTPS_PORT;
        termination = TLSTermination::Passthrough;
        policy = InsecureEdgeTerminationPolicy::Redirect;
    }

    Ok(Some(Route {
        metadata: ObjectMeta {
            name: Some(route_name(uid, host)),
            namespace: Some(service_namespace),
            labels: Some(labels),
            annotations: Some(annotations),
            ..Default::default()
        },
        spec: RouteSpec {
            host: host.to_string(),
            to: RouteTargetReference {
                kind: "Service".to_string(),
                name: service_name,
                weight: Some(ROUTE_WEIGHT),
            },
            port: Some(RoutePort {
                target_port: IntOrString::String(target_port.to_string()),
            }),
            tls: Some(TLSConfig {
                termination,
                insecure_edge_termination_policy: Some(policy),
            }),
            wildcard_policy: WildcardPolicy::None,
        },
        status: None,
    }))
}

#[cfg(test)]
#[path = "translate_test.rs"]
mod tests;
