pub mod defaults;
pub mod ingress;
pub mod logging;
pub mod monitoring;
pub mod namespace;
pub mod reconcile;
pub mod resolve;
pub mod version;

pub use reconcile::{reconcile_serving, serving_error_policy};
pub use resolve::{resolve_serving, ObservedFacts, Resolution};
