// ABOUTME: Environment variable value types for the pod environment.
// ABOUTME: Literals, caller-environment references, and secret references.

use super::error::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;

/// A value for one container environment variable.
///
/// `FromEnv` entries are resolved into literals once at config load;
/// `SecretRef` entries stay symbolic and render as a `secretKeyRef` so the
/// secret material never passes through this process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
    SecretRef {
        secret: String,
        key: String,
    },
}

impl EnvValue {
    pub fn resolve(&self) -> Result<EnvValue, ConfigError> {
        match self {
            EnvValue::Literal(_) | EnvValue::SecretRef { .. } => Ok(self.clone()),
            EnvValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) => Ok(EnvValue::Literal(val)),
                Err(_) => default
                    .clone()
                    .map(EnvValue::Literal)
                    .ok_or_else(|| ConfigError::MissingEnvVar(var.clone())),
            },
        }
    }
}

pub fn resolve_env_map(
    map: &HashMap<String, EnvValue>,
) -> Result<HashMap<String, EnvValue>, ConfigError> {
    map.iter()
        .map(|(k, v)| v.resolve().map(|resolved| (k.clone(), resolved)))
        .collect()
}
