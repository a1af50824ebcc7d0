//! Operator configuration read from the process environment
//!
//! Everything is read once at startup. Tests build `OperatorConfig` from an
//! explicit list of variables instead of touching the real environment.

use std::collections::BTreeMap;
use thiserror::Error;

pub const REQUIRED_NAMESPACE_ENV: &str = "REQUIRED_SERVING_NAMESPACE";
pub const MIN_KUBERNETES_VERSION_ENV: &str = "MIN_KUBERNETES_VERSION";
pub const ENABLE_MONITORING_ENV: &str = "ENABLE_SERVING_MONITORING_BY_DEFAULT";
pub const HEALTH_PORT_ENV: &str = "HEALTH_PORT";

/// Prefix of per-component image override variables, e.g. `IMAGE_queue-proxy`
pub const IMAGE_ENV_PREFIX: &str = "IMAGE_";

pub const DEFAULT_MIN_KUBERNETES_VERSION: &str = "1.20.0";
pub const DEFAULT_HEALTH_PORT: u16 = 8080;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a boolean, got {value:?}")]
    InvalidBool { name: &'static str, value: String },

    #[error("{name} must be a port number, got {value:?}")]
    InvalidPort { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatorConfig {
    /// Namespace every KnativeServing must live in (unset: any namespace)
    pub required_namespace: Option<String>,

    /// Lowest platform version the operator installs onto
    pub minimum_kubernetes_version: String,

    /// Environment-level monitoring switch (unset, on or off)
    pub monitoring_toggle: Option<bool>,

    /// Component name to image, from `IMAGE_*` variables
    pub image_overrides: BTreeMap<String, String>,

    pub health_port: u16,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            required_namespace: None,
            minimum_kubernetes_version: DEFAULT_MIN_KUBERNETES_VERSION.to_string(),
            monitoring_toggle: None,
            image_overrides: BTreeMap::new(),
            health_port: DEFAULT_HEALTH_PORT,
        }
    }
}

impl OperatorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Build the config from `(name, value)` pairs
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = Self::default();

        for (name, value) in vars {
            if let Some(component) = name.strip_prefix(IMAGE_ENV_PREFIX) {
                if !component.is_empty() {
                    config.image_overrides.insert(component.to_string(), value);
                }
                continue;
            }

            match name.as_str() {
                REQUIRED_NAMESPACE_ENV if !value.is_empty() => {
                    config.required_namespace = Some(value);
                }
                MIN_KUBERNETES_VERSION_ENV if !value.is_empty() => {
                    config.minimum_kubernetes_version = value;
                }
                ENABLE_MONITORING_ENV => {
                    config.monitoring_toggle = Some(parse_bool(ENABLE_MONITORING_ENV, &value)?);
                }
                HEALTH_PORT_ENV => {
                    config.health_port =
                        value.parse().map_err(|_| ConfigError::InvalidPort {
                            name: HEALTH_PORT_ENV,
                            value: value.clone(),
                        })?;
                }
                _ => {}
            }
        }

        Ok(config)
    }
}

/// Boolean parsing with the spellings operators commonly set in manifests
fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name,
            value: value.to_string(),
        }),
    }
}
