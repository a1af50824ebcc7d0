use crate::crd::serving::{KnativeServingStatus, CONDITION_INSTALL_SUCCEEDED};
use chrono::{DateTime, Utc};

pub const NAMESPACE_MISMATCH_REASON: &str = "NamespaceMismatch";

/// Outcome of the install-namespace check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceCheck {
    Allowed,
    Mismatch { required: String },
}

impl NamespaceCheck {
    pub fn message(&self) -> Option<String> {
        match self {
            NamespaceCheck::Allowed => None,
            NamespaceCheck::Mismatch { required } => Some(format!(
                "Knative Serving must be installed into the namespace {required:?}"
            )),
        }
    }
}

/// Check the resource's namespace against the configured one
///
/// No required namespace configured means any namespace is accepted.
pub fn check_namespace(actual: Option<&str>, required: Option<&str>) -> NamespaceCheck {
    match required {
        Some(required) if actual != Some(required) => NamespaceCheck::Mismatch {
            required: required.to_string(),
        },
        _ => NamespaceCheck::Allowed,
    }
}

/// Record the check on the status
///
/// A mismatch is terminal until the resource is recreated elsewhere; a pass
/// only clears a failure this guard recorded earlier.
pub fn record_namespace_check(
    status: &mut KnativeServingStatus,
    check: &NamespaceCheck,
    now: DateTime<Utc>,
) {
    match check.message() {
        Some(message) => status.mark_install_failed(NAMESPACE_MISMATCH_REASON, message, now),
        None => {
            let recorded_by_guard = status
                .condition(CONDITION_INSTALL_SUCCEEDED)
                .is_some_and(|c| c.reason.as_deref() == Some(NAMESPACE_MISMATCH_REASON));
            if recorded_by_guard {
                status.remove_condition(CONDITION_INSTALL_SUCCEEDED);
            }
        }
    }
}
