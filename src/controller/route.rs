//! Ingress to OpenShift Route translation
//!
//! `translate` is the pure part; `reconcile` persists what it produces.

pub mod reconcile;
pub mod translate;

pub use reconcile::{ingress_error_policy, reconcile_ingress, routes_for_ingress, INGRESS_FINALIZER};
pub use translate::{make_routes, route_name, RouteError};
