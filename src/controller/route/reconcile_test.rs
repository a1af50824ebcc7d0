#![allow(clippy::unwrap_used)]

use super::*;
use crate::config::OperatorConfig;
use crate::controller::facts::MockClusterFacts;
use crate::crd::ingress::IngressSpec;
use crate::crd::route::RouteSpec;
use crate::server::create_metrics;
use std::collections::BTreeMap;

fn route(namespace: &str, name: &str) -> Route {
    let mut r = Route::new(name, RouteSpec::default());
    r.metadata.namespace = Some(namespace.to_string());
    r
}

fn ctx() -> Context {
    Context::new_mock(MockClusterFacts::new("v1.28.0"), OperatorConfig::default())
}

#[test]
fn test_selector_names_owner() {
    assert_eq!(
        ingress_selector("hello", "default"),
        "serving.knative.openshift.io/ingressName=hello,serving.knative.openshift.io/ingressNamespace=default"
    );
}

#[test]
fn test_labelled_route_maps_back_to_ingress() {
    let mut r = route("knative-serving-ingress", "route-abc-45a335");
    r.metadata.labels = Some(BTreeMap::from([
        (INGRESS_NAME_LABEL.to_string(), "hello".to_string()),
        (INGRESS_NAMESPACE_LABEL.to_string(), "default".to_string()),
    ]));

    let owner = routes_for_ingress(r).unwrap();

    assert_eq!(owner, ObjectRef::<Ingress>::new("hello").within("default"));
}

#[test]
fn test_unlabelled_route_maps_to_nothing() {
    assert!(routes_for_ingress(route("knative-serving-ingress", "other")).is_none());
}

#[test]
fn test_stale_routes_are_existing_minus_desired() {
    let existing = vec![
        route("knative-serving-ingress", "route-abc-111111"),
        route("knative-serving-ingress", "route-abc-222222"),
        route("other-ns", "route-abc-111111"),
    ];
    let desired = vec![route("knative-serving-ingress", "route-abc-111111")];

    let stale = stale_routes(&existing, &desired);

    assert_eq!(
        stale,
        vec![
            (
                "knative-serving-ingress".to_string(),
                "route-abc-222222".to_string()
            ),
            ("other-ns".to_string(), "route-abc-111111".to_string()),
        ]
    );
}

#[test]
fn test_nothing_desired_means_everything_is_stale() {
    let existing = vec![route("ns", "a"), route("ns", "b")];
    assert_eq!(stale_routes(&existing, &[]).len(), 2);
}

#[test]
fn test_finalizer_detection() {
    let mut ing = Ingress::new("hello", IngressSpec::default());
    assert!(!has_finalizer(&ing));

    ing.metadata.finalizers = Some(vec!["other".to_string(), INGRESS_FINALIZER.to_string()]);
    assert!(has_finalizer(&ing));
}

#[tokio::test]
async fn test_missing_namespace_rejected_before_any_request() {
    let ing = Arc::new(Ingress::new("hello", IngressSpec::default()));

    let err = reconcile_ingress(ing, Arc::new(ctx())).await.unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::MissingNamespace { kind: "Ingress" }
    ));
}

#[tokio::test]
async fn test_translation_error_surfaces_before_any_request() {
    let mut ing = Ingress::new(
        "hello",
        IngressSpec {
            rules: vec![crate::crd::ingress::IngressRule {
                hosts: vec!["foo.example.com".to_string()],
                ..Default::default()
            }],
            ..Default::default()
        },
    );
    ing.metadata.namespace = Some("default".to_string());
    ing.metadata.uid = Some("abc".to_string());

    let err = reconcile_ingress(Arc::new(ing), Arc::new(ctx()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::Route(crate::controller::route::RouteError::NoValidLoadBalancerDomain)
    ));
}

#[tokio::test]
async fn test_deleted_ingress_drops_route_gauge() {
    let yaml = r#"
apiVersion: networking.internal.knative.dev/v1alpha1
kind: Ingress
metadata:
  name: hello
  namespace: default
  deletionTimestamp: "2024-05-01T10:00:00Z"
spec: {}
"#;
    let ing: Ingress = serde_yaml::from_str(yaml).unwrap();
    let metrics = create_metrics().unwrap();
    metrics.set_route_count("default", "hello", 2);
    let mut ctx = ctx();
    ctx.metrics = Some(metrics.clone());

    let action = reconcile_ingress(Arc::new(ing), Arc::new(ctx))
        .await
        .unwrap();

    assert_eq!(action, Action::await_change());
    assert!(!metrics.encode().unwrap().contains(r#"ingress="hello""#));
}

#[tokio::test]
async fn test_error_policy_requeues_and_counts() {
    let metrics = create_metrics().unwrap();
    let mut ctx = ctx();
    ctx.metrics = Some(metrics.clone());
    let ing = Arc::new(Ingress::new("hello", IngressSpec::default()));
    let error = ReconcileError::MissingNamespace { kind: "Ingress" };

    let action = ingress_error_policy(ing, &error, Arc::new(ctx));

    assert_eq!(action, Action::requeue(Duration::from_secs(10)));
    assert!(metrics
        .encode()
        .unwrap()
        .contains(r#"controller="ingress",result="error"} 1"#));
}
