//! Read-only cluster lookups feeding a KnativeServing pass
//!
//! The resolver never touches the API server. Everything it needs from the
//! outside world is read here first and handed over as `ObservedFacts`.

use crate::controller::serving::logging::{LOGGING_ROUTE_NAME, LOGGING_ROUTE_NAMESPACE};
use crate::controller::serving::ObservedFacts;
use crate::crd::route::Route;
use async_trait::async_trait;
use kube::api::Api;
use kube::core::DynamicObject;
use kube::discovery::ApiResource;
use kube::Client;
use thiserror::Error;
use tracing::debug;

/// Cluster-scoped OpenShift ingress config holding the base domain
const CLUSTER_INGRESS_NAME: &str = "cluster";

#[derive(Debug, Error)]
pub enum FactsError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),
}

#[async_trait]
pub trait ClusterFacts: Send + Sync {
    /// API server `gitVersion`, e.g. `v1.28.3+k3s1`
    async fn kubernetes_version(&self) -> Result<String, FactsError>;

    /// `spec.domain` of the cluster ingress config, if there is one
    async fn cluster_domain(&self) -> Result<Option<String>, FactsError>;

    /// Host of the logging stack's route, if it is installed
    async fn logging_host(&self) -> Result<Option<String>, FactsError>;
}

/// Gather everything one pass needs; any failed read fails the whole pass
pub async fn gather_facts(facts: &dyn ClusterFacts) -> Result<ObservedFacts, FactsError> {
    let (kubernetes_version, cluster_domain, logging_host) = futures::try_join!(
        facts.kubernetes_version(),
        facts.cluster_domain(),
        facts.logging_host(),
    )?;

    Ok(ObservedFacts {
        kubernetes_version,
        cluster_domain,
        logging_host,
    })
}

pub struct KubeClusterFacts {
    client: Client,
}

impl KubeClusterFacts {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterFacts for KubeClusterFacts {
    async fn kubernetes_version(&self) -> Result<String, FactsError> {
        Ok(self.client.apiserver_version().await?.git_version)
    }

    async fn cluster_domain(&self) -> Result<Option<String>, FactsError> {
        let ar = ApiResource {
            group: "config.openshift.io".to_string(),
            version: "v1".to_string(),
            api_version: "config.openshift.io/v1".to_string(),
            kind: "Ingress".to_string(),
            plural: "ingresses".to_string(),
        };
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &ar);

        match api.get(CLUSTER_INGRESS_NAME).await {
            Ok(ingress) => Ok(ingress
                .data
                .pointer("/spec/domain")
                .and_then(|d| d.as_str())
                .filter(|d| !d.is_empty())
                .map(str::to_string)),
            Err(kube::Error::Api(err)) if err.code == 404 => {
                debug!("No cluster ingress config, skipping domain default");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn logging_host(&self) -> Result<Option<String>, FactsError> {
        let api: Api<Route> = Api::namespaced(self.client.clone(), LOGGING_ROUTE_NAMESPACE);

        match api.get(LOGGING_ROUTE_NAME).await {
            Ok(route) => Ok(route
                .admitted_host()
                .or(Some(route.spec.host.as_str()))
                .filter(|h| !h.is_empty())
                .map(str::to_string)),
            Err(kube::Error::Api(err)) if err.code == 404 => {
                debug!(
                    namespace = LOGGING_ROUTE_NAMESPACE,
                    route = LOGGING_ROUTE_NAME,
                    "Logging route not found"
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Canned facts for tests
#[cfg(test)]
#[derive(Default)]
pub struct MockClusterFacts {
    pub facts: ObservedFacts,
}

#[cfg(test)]
impl MockClusterFacts {
    pub fn new(kubernetes_version: &str) -> Self {
        Self {
            facts: ObservedFacts {
                kubernetes_version: kubernetes_version.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn with_cluster_domain(mut self, domain: &str) -> Self {
        self.facts.cluster_domain = Some(domain.to_string());
        self
    }

    pub fn with_logging_host(mut self, host: &str) -> Self {
        self.facts.logging_host = Some(host.to_string());
        self
    }
}

#[cfg(test)]
#[async_trait]
impl ClusterFacts for MockClusterFacts {
    async fn kubernetes_version(&self) -> Result<String, FactsError> {
        Ok(self.facts.kubernetes_version.clone())
    }

    async fn cluster_domain(&self) -> Result<Option<String>, FactsError> {
        Ok(self.facts.cluster_domain.clone())
    }

    async fn logging_host(&self) -> Result<Option<String>, FactsError> {
        Ok(self.facts.logging_host.clone())
    }
}
