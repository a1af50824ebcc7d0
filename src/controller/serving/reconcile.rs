use crate::controller::context::{Context, ReconcileError};
use crate::controller::facts::gather_facts;
use crate::crd::serving::{KnativeServing, KnativeServingStatus};
use crate::server::CONTROLLER_SERVING;
use k8s_openapi::api::core::v1::Namespace;
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::ResourceExt;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::monitoring::ENABLE_MONITORING_LABEL;
use super::resolve::{resolve_serving, Resolution};

/// A failed gate only clears when the cluster changes, so poll rather than spin
const BLOCKED_REQUEUE: Duration = Duration::from_secs(60);
/// Periodic resync so fact changes (logging route, cluster domain) get picked up
const RESYNC: Duration = Duration::from_secs(300);
const ERROR_REQUEUE: Duration = Duration::from_secs(10);

/// Reconcile a KnativeServing
///
/// 1. Reads the cluster facts (platform version, cluster domain, logging route)
/// 2. Runs the pure resolver over spec, status and facts
/// 3. Writes back the resolved spec and status if either changed
/// 4. Sets the monitoring label on the installation namespace
pub async fn reconcile_serving(
    serving: Arc<KnativeServing>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start_time = std::time::Instant::now();

    let namespace = serving
        .namespace()
        .ok_or(ReconcileError::MissingNamespace {
            kind: "KnativeServing",
        })?;
    let name = serving.name_any();

    info!(serving = ?name, namespace = ?namespace, "Reconciling KnativeServing");

    let facts = gather_facts(ctx.facts.as_ref()).await?;
    let resolution = resolve_serving(&serving, &facts, &ctx.config, ctx.condition_time());

    let api: Api<KnativeServing> = Api::namespaced(ctx.client.clone(), &namespace);

    if resolution.spec != serving.spec {
        info!(serving = ?name, "Writing resolved KnativeServing spec");
        api.patch(
            &name,
            &PatchParams::default(),
            &Patch::Merge(&json!({ "spec": resolution.spec })),
        )
        .await?;
    }

    if serving.status.as_ref() != Some(&resolution.status) {
        debug!(serving = ?name, "Updating KnativeServing status");
        api.patch_status(
            &name,
            &PatchParams::default(),
            &Patch::Merge(&status_patch(&resolution.status)),
        )
        .await?;
    }

    let action = if resolution.is_blocked() {
        warn!(serving = ?name, "Installation blocked, leaving namespace untouched");
        Action::requeue(BLOCKED_REQUEUE)
    } else {
        label_namespace(&ctx, &namespace, &resolution).await?;
        Action::requeue(RESYNC)
    };

    if let Some(ref metrics) = ctx.metrics {
        metrics.record_reconciliation_success(
            CONTROLLER_SERVING,
            start_time.elapsed().as_secs_f64(),
        );
    }

    Ok(action)
}

/// Merge patch body for the status subresource
///
/// Every field is spelled out, even when empty or unset. A merge patch leaves
/// absent keys alone, so a recovered gate would otherwise keep its stale
/// `False` conditions; `null` clears `version` and `observedGeneration`.
fn status_patch(status: &KnativeServingStatus) -> serde_json::Value {
    json!({
        "status": {
            "version": status.version,
            "observedGeneration": status.observed_generation,
            "conditions": status.conditions,
        }
    })
}

async fn label_namespace(
    ctx: &Context,
    namespace: &str,
    resolution: &Resolution,
) -> Result<(), ReconcileError> {
    let value = resolution.monitoring.label_value();
    let namespaces: Api<Namespace> = Api::all(ctx.client.clone());

    namespaces
        .patch(
            namespace,
            &PatchParams::default(),
            &Patch::Merge(&json!({
                "metadata": { "labels": { ENABLE_MONITORING_LABEL: value } }
            })),
        )
        .await?;

    debug!(namespace = ?namespace, monitoring = value, "Namespace monitoring label set");
    Ok(())
}

/// Log, count, and retry shortly
pub fn serving_error_policy(
    serving: Arc<KnativeServing>,
    error: &ReconcileError,
    ctx: Arc<Context>,
) -> Action {
    warn!(serving = ?serving.name_any(), error = %error, "Reconcile error (will retry)");

    if let Some(ref metrics) = ctx.metrics {
        metrics.record_reconciliation_error(CONTROLLER_SERVING);
    }

    Action::requeue(ERROR_REQUEUE)
}
