#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use kube::CustomResourceExt;

fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

#[test]
fn test_knative_serving_deserialize_from_yaml() {
    let yaml = r#"
apiVersion: operator.knative.dev/v1beta1
kind: KnativeServing
metadata:
  name: knative-serving
  namespace: knative-serving
spec:
  high-availability:
    replicas: 3
  controller-custom-certs:
    type: Secret
    name: my-certs
  registry:
    default: quay.io/knative/${NAME}:v1.12
    override:
      queue-proxy: quay.io/knative/queue:v1.12
  resources:
    - container: activator
      limits:
        memory: 600Mi
  config:
    network:
      ingress.class: kourier.ingress.networking.knative.dev
  ingress:
    kourier:
      enabled: true
      service-type: LoadBalancer
"#;

    let ks: KnativeServing = serde_yaml::from_str(yaml).expect("valid KnativeServing");

    assert_eq!(ks.spec.high_availability, Some(HighAvailability { replicas: 3 }));
    assert_eq!(ks.spec.controller_custom_certs.cert_type, "Secret");
    assert_eq!(ks.spec.controller_custom_certs.name, "my-certs");
    assert_eq!(
        ks.spec.registry.image_for("queue-proxy"),
        Some("quay.io/knative/queue:v1.12")
    );
    assert_eq!(
        ks.spec.registry.image_for("activator"),
        Some("quay.io/knative/${NAME}:v1.12")
    );
    assert_eq!(ks.spec.resources[0].container, "activator");
    assert_eq!(
        ks.spec.resources[0].limits.as_ref().unwrap()["memory"],
        Quantity("600Mi".to_string())
    );
    assert_eq!(
        ks.spec.config.get("network", "ingress.class"),
        Some("kourier.ingress.networking.knative.dev")
    );
    let ingress = ks.spec.ingress.unwrap();
    assert!(ingress.kourier.enabled);
    assert_eq!(ingress.kourier.service_type, Some(ServiceType::LoadBalancer));
    assert!(!ingress.istio.enabled);
}

#[test]
fn test_empty_spec_deserializes_to_default() {
    let yaml = r#"
apiVersion: operator.knative.dev/v1beta1
kind: KnativeServing
metadata:
  name: knative-serving
spec: {}
"#;

    let ks: KnativeServing = serde_yaml::from_str(yaml).unwrap();

    assert_eq!(ks.spec, KnativeServingSpec::default());
}

#[test]
fn test_unset_fields_are_not_serialized() {
    let json = serde_json::to_value(KnativeServingSpec::default()).unwrap();

    assert!(json.get("high-availability").is_none());
    assert!(json.get("resources").is_none());
    assert!(json.get("config").is_none());
    assert!(json.get("ingress").is_none());
}

#[test]
fn test_registry_without_default_has_no_fallback() {
    let registry = Registry::default();
    assert_eq!(registry.image_for("activator"), None);
}

#[test]
fn test_config_set_if_absent_keeps_existing() {
    let mut config = ConfigMapData::default();

    assert!(config.set_if_absent("network", "ingress.class", "a"));
    assert!(!config.set_if_absent("network", "ingress.class", "b"));

    assert_eq!(config.get("network", "ingress.class"), Some("a"));
    assert!(config.contains("network", "ingress.class"));
    assert!(!config.contains("network", "other"));
}

#[test]
fn test_config_set_overwrites() {
    let mut config = ConfigMapData::default();
    config.set("observability", "metrics.backend-destination", "prometheus");
    config.set("observability", "metrics.backend-destination", "none");

    assert_eq!(
        config.get("observability", "metrics.backend-destination"),
        Some("none")
    );
}

#[test]
fn test_condition_transition_time_moves_only_on_flip() {
    let mut status = KnativeServingStatus::default();
    let t0 = at("2024-05-01T10:00:00Z");
    let t1 = at("2024-05-01T10:05:00Z");
    let t2 = at("2024-05-01T10:10:00Z");

    status.set_condition(CONDITION_READY, "False", Some("A"), None, t0);
    status.set_condition(CONDITION_READY, "False", Some("B"), Some("msg".into()), t1);

    let cond = status.condition(CONDITION_READY).unwrap();
    assert_eq!(cond.reason.as_deref(), Some("B"));
    assert_eq!(cond.last_transition_time, Some(t0.to_rfc3339()));

    status.set_condition(CONDITION_READY, "True", None, None, t2);

    let cond = status.condition(CONDITION_READY).unwrap();
    assert_eq!(cond.last_transition_time, Some(t2.to_rfc3339()));
    assert_eq!(cond.message, None);
    assert_eq!(status.conditions.len(), 1);
}

#[test]
fn test_install_failure_marks_ready_false() {
    let mut status = KnativeServingStatus::default();

    status.mark_install_failed("NamespaceMismatch", "wrong place".into(), at("2024-05-01T10:00:00Z"));

    assert!(status.is_false(CONDITION_INSTALL_SUCCEEDED));
    assert!(status.is_false(CONDITION_READY));
    assert!(status.condition(CONDITION_DEPENDENCIES_INSTALLED).is_none());
}

#[test]
fn test_dependency_missing_then_installed() {
    let mut status = KnativeServingStatus::default();
    let now = at("2024-05-01T10:00:00Z");

    status.mark_dependency_missing("VersionTooLow", "too old".into(), now);
    assert!(status.is_false(CONDITION_DEPENDENCIES_INSTALLED));
    assert!(status.is_false(CONDITION_READY));

    status.mark_dependencies_installed(now);
    assert_eq!(
        status.condition(CONDITION_DEPENDENCIES_INSTALLED).unwrap().status,
        "True"
    );

    status.remove_condition(CONDITION_READY);
    assert!(status.condition(CONDITION_READY).is_none());
}

#[test]
fn test_status_serializes_in_kubernetes_shape() {
    let mut status = KnativeServingStatus {
        observed_generation: Some(3),
        ..Default::default()
    };
    status.set_condition(
        CONDITION_READY,
        "False",
        Some("VersionTooLow"),
        None,
        at("2024-05-01T10:00:00Z"),
    );

    let json = serde_json::to_value(&status).unwrap();

    assert_eq!(json["observedGeneration"], 3);
    assert_eq!(json["conditions"][0]["type"], "Ready");
    assert_eq!(json["conditions"][0]["reason"], "VersionTooLow");
    assert_eq!(
        json["conditions"][0]["lastTransitionTime"],
        "2024-05-01T10:00:00+00:00"
    );
}

#[test]
fn test_crd_generation() {
    let crd = KnativeServing::crd();

    assert_eq!(crd.spec.group, "operator.knative.dev");
    assert_eq!(crd.spec.names.kind, "KnativeServing");
    assert_eq!(crd.spec.names.plural, "knativeservings");
    assert_eq!(crd.spec.scope, "Namespaced");

    let version = &crd.spec.versions[0];
    assert_eq!(version.name, "v1beta1");
    assert!(version
        .subresources
        .as_ref()
        .and_then(|s| s.status.as_ref())
        .is_some());
    assert_eq!(version.additional_printer_columns.as_ref().unwrap().len(), 3);
}
