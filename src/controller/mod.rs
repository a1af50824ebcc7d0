pub mod context;
pub mod facts;
pub mod route;
pub mod serving;

pub use context::{Context, ReconcileError};
