use crate::controller::context::{Context, ReconcileError};
use crate::crd::ingress::Ingress;
use crate::crd::route::Route;
use crate::server::CONTROLLER_INGRESS;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::runtime::reflector::ObjectRef;
use kube::ResourceExt;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::translate::{make_routes, INGRESS_NAMESPACE_LABEL, INGRESS_NAME_LABEL};

/// Holds an Ingress until the Routes derived from it are gone
pub const INGRESS_FINALIZER: &str = "ocp-ingress";

/// Field manager for server-side apply of Routes
const FIELD_MANAGER: &str = "serverless-operator";

const RESYNC: Duration = Duration::from_secs(300);
const ERROR_REQUEUE: Duration = Duration::from_secs(10);

/// Label selector matching every Route derived from one Ingress
pub fn ingress_selector(name: &str, namespace: &str) -> String {
    format!("{INGRESS_NAME_LABEL}={name},{INGRESS_NAMESPACE_LABEL}={namespace}")
}

/// Map a Route back to the Ingress it was derived from, via its labels
pub fn routes_for_ingress(route: Route) -> Option<ObjectRef<Ingress>> {
    let labels = route.labels();
    let name = labels.get(INGRESS_NAME_LABEL)?;
    let namespace = labels.get(INGRESS_NAMESPACE_LABEL)?;
    Some(ObjectRef::new(name).within(namespace))
}

/// Existing Routes not in `desired`, as `(namespace, name)`
pub fn stale_routes(existing: &[Route], desired: &[Route]) -> Vec<(String, String)> {
    let keep: BTreeSet<(Option<&str>, Option<&str>)> = desired
        .iter()
        .map(|r| (r.metadata.namespace.as_deref(), r.metadata.name.as_deref()))
        .collect();

    existing
        .iter()
        .filter(|r| !keep.contains(&(r.metadata.namespace.as_deref(), r.metadata.name.as_deref())))
        .filter_map(|r| Some((r.metadata.namespace.clone()?, r.metadata.name.clone()?)))
        .collect()
}

fn has_finalizer(ingress: &Ingress) -> bool {
    ingress.finalizers().iter().any(|f| f == INGRESS_FINALIZER)
}

/// Reconcile an Ingress into its set of Routes
///
/// The whole set is recomputed each pass. Every desired Route is applied,
/// then labelled Routes that are no longer desired are deleted. A translation
/// error aborts the pass before anything is written.
pub async fn reconcile_ingress(
    ingress: Arc<Ingress>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start_time = std::time::Instant::now();

    let namespace = ingress
        .namespace()
        .ok_or(ReconcileError::MissingNamespace { kind: "Ingress" })?;
    let name = ingress.name_any();
    let ingresses: Api<Ingress> = Api::namespaced(ctx.client.clone(), &namespace);

    if ingress.metadata.deletion_timestamp.is_some() {
        if has_finalizer(&ingress) {
            delete_routes(&ctx, &name, &namespace, &[]).await?;
            remove_finalizer(&ingresses, &ingress).await?;
            info!(ingress = ?name, namespace = ?namespace, "Routes cleaned up, finalizer removed");
        }
        if let Some(ref metrics) = ctx.metrics {
            metrics.remove_route_count(&namespace, &name);
        }
        return Ok(Action::await_change());
    }

    let desired = make_routes(&ingress)?;

    if !has_finalizer(&ingress) {
        add_finalizer(&ingresses, &ingress).await?;
    }

    for route in &desired {
        let route_name = route.name_any();
        let route_ns = route.namespace().unwrap_or_default();
        let routes: Api<Route> = Api::namespaced(ctx.client.clone(), &route_ns);
        routes
            .patch(
                &route_name,
                &PatchParams::apply(FIELD_MANAGER).force(),
                &Patch::Apply(route),
            )
            .await?;
        debug!(ingress = ?name, route = ?route_name, host = %route.spec.host, "Route applied");
    }

    let deleted = delete_routes(&ctx, &name, &namespace, &desired).await?;

    info!(
        ingress = ?name,
        namespace = ?namespace,
        routes = desired.len(),
        deleted = deleted,
        "Reconciled Ingress routes"
    );

    if let Some(ref metrics) = ctx.metrics {
        metrics.set_route_count(&namespace, &name, desired.len());
        metrics.record_reconciliation_success(
            CONTROLLER_INGRESS,
            start_time.elapsed().as_secs_f64(),
        );
    }

    Ok(Action::requeue(RESYNC))
}

/// Delete every Route labelled for this Ingress that is not in `desired`
async fn delete_routes(
    ctx: &Context,
    name: &str,
    namespace: &str,
    desired: &[Route],
) -> Result<usize, ReconcileError> {
    let all: Api<Route> = Api::all(ctx.client.clone());
    let existing = all
        .list(&ListParams::default().labels(&ingress_selector(name, namespace)))
        .await?;

    let stale = stale_routes(&existing.items, desired);
    for (route_ns, route_name) in &stale {
        let routes: Api<Route> = Api::namespaced(ctx.client.clone(), route_ns);
        match routes.delete(route_name, &DeleteParams::default()).await {
            Ok(_) => debug!(ingress = ?name, route = ?route_name, "Stale route deleted"),
            Err(kube::Error::Api(err)) if err.code == 404 => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(stale.len())
}

async fn add_finalizer(api: &Api<Ingress>, ingress: &Ingress) -> Result<(), ReconcileError> {
    let mut finalizers = ingress.finalizers().to_vec();
    finalizers.push(INGRESS_FINALIZER.to_string());
    api.patch(
        &ingress.name_any(),
        &PatchParams::default(),
        &Patch::Merge(&json!({ "metadata": { "finalizers": finalizers } })),
    )
    .await?;
    Ok(())
}

async fn remove_finalizer(api: &Api<Ingress>, ingress: &Ingress) -> Result<(), ReconcileError> {
    let finalizers: Vec<&String> = ingress
        .finalizers()
        .iter()
        .filter(|f| *f != INGRESS_FINALIZER)
        .collect();
    api.patch(
        &ingress.name_any(),
        &PatchParams::default(),
        &Patch::Merge(&json!({ "metadata": { "finalizers": finalizers } })),
    )
    .await?;
    Ok(())
}

pub fn ingress_error_policy(ingress: Arc<Ingress>, error: &ReconcileError, ctx: Arc<Context>) -> Action {
    warn!(
        ingress = ?ingress.name_any(),
        namespace = ?ingress.namespace(),
        error = %error,
        "Reconcile error (will retry)"
    );

    if let Some(ref metrics) = ctx.metrics {
        metrics.record_reconciliation_error(CONTROLLER_INGRESS);
    }

    Action::requeue(ERROR_REQUEUE)
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
