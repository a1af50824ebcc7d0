use crate::crd::serving::ConfigMapData;

use super::monitoring::OBSERVABILITY_SECTION;

/// The cluster logging stack's route, managed outside this operator
pub const LOGGING_ROUTE_NAMESPACE: &str = "openshift-logging";
pub const LOGGING_ROUTE_NAME: &str = "kibana";

pub const REVISION_URL_TEMPLATE_KEY: &str = "logging.revision-url-template";

/// Kibana discover link filtered to one revision; `${REVISION_UID}` is
/// substituted by the serving controller, not here.
pub fn revision_url_template(host: &str) -> String {
    format!(
        "https://{host}/app/kibana#/discover?_a=(index:.all,query:'kubernetes.labels.serving_knative_dev%5C%2FrevisionUID:${{REVISION_UID}}')"
    )
}

/// Point revision log links at the logging route, if one was found
///
/// Returns true if the template was written. A missing route, or one without
/// an admitted host, is simply skipped.
pub fn apply_logging_route(config: &mut ConfigMapData, logging_host: Option<&str>) -> bool {
    match logging_host.filter(|h| !h.is_empty()) {
        Some(host) => config.set_if_absent(
            OBSERVABILITY_SECTION,
            REVISION_URL_TEMPLATE_KEY,
            &revision_url_template(host),
        ),
        None => false,
    }
}
