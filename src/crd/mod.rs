pub mod ingress;
pub mod route;
pub mod serving;
