use futures::StreamExt;
use kube::runtime::{watcher, Controller};
use kube::{Api, Client};
use serverless_operator::config::OperatorConfig;
use serverless_operator::controller::route::translate::INGRESS_NAME_LABEL;
use serverless_operator::controller::route::{
    ingress_error_policy, reconcile_ingress, routes_for_ingress,
};
use serverless_operator::controller::serving::{reconcile_serving, serving_error_policy};
use serverless_operator::controller::Context;
use serverless_operator::crd::ingress::Ingress;
use serverless_operator::crd::route::Route;
use serverless_operator::crd::serving::KnativeServing;
use serverless_operator::server::{
    create_metrics, run_health_server, wait_for_signal, ReadinessState, Shutdown,
};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = match OperatorConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Invalid operator configuration");
            return Err(e.into());
        }
    };
    info!(
        required_namespace = ?config.required_namespace,
        min_kubernetes_version = %config.minimum_kubernetes_version,
        monitoring = ?config.monitoring_toggle,
        images = config.image_overrides.len(),
        "Starting serverless operator"
    );

    let shutdown = Shutdown::new();
    let readiness = ReadinessState::new();
    let metrics = create_metrics()?;

    let client = match Client::try_default().await {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to create Kubernetes client");
            return Err(e.into());
        }
    };
    info!("Connected to Kubernetes cluster");

    let health_port = config.health_port;
    let health_readiness = readiness.clone();
    let health_metrics = metrics.clone();
    let health_shutdown = shutdown.clone();
    let health_handle = tokio::spawn(async move {
        if let Err(e) =
            run_health_server(health_port, health_readiness, health_metrics, health_shutdown).await
        {
            warn!(error = %e, "Health server failed");
        }
    });

    let ctx = Arc::new(Context::new(client.clone(), config, Some(metrics)));

    let serving_controller = Controller::new(
        Api::<KnativeServing>::all(client.clone()),
        watcher::Config::default(),
    )
    .run(reconcile_serving, serving_error_policy, ctx.clone())
    .for_each(|res| async move {
        if let Ok(o) = res {
            info!("Reconciled KnativeServing: {:?}", o);
        }
    });

    // Routes live in the gateway namespace, so they are tied back to their
    // Ingress by label rather than by owner reference
    let ingress_controller =
        Controller::new(Api::<Ingress>::all(client.clone()), watcher::Config::default())
            .watches(
                Api::<Route>::all(client.clone()),
                watcher::Config::default().labels(INGRESS_NAME_LABEL),
                routes_for_ingress,
            )
            .run(reconcile_ingress, ingress_error_policy, ctx)
            .for_each(|res| async move {
                if let Ok(o) = res {
                    info!("Reconciled Ingress: {:?}", o);
                }
            });

    readiness.set_ready();
    info!("Controllers ready, starting reconciliation loops");

    tokio::select! {
        _ = futures::future::join(serving_controller, ingress_controller) => {
            info!("Controller streams ended");
        }
        signal = wait_for_signal() => {
            match signal {
                Ok(name) => info!(signal = name, "Initiating graceful shutdown"),
                Err(e) => error!(error = %e, "Cannot listen for shutdown signals, stopping"),
            }
            readiness.set_not_ready();
        }
    }

    shutdown.trigger();
    if let Err(e) = health_handle.await {
        warn!(error = %e, "Health server task did not stop cleanly");
    }

    info!("Serverless operator shut down");
    Ok(())
}
