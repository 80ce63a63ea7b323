// ABOUTME: Registry and cluster target configuration sections.
// ABOUTME: Where the image goes and which cluster/namespace receives it.

use super::env_value::EnvValue;
use super::error::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;

/// Remote registry the built image is published to.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub url: String,

    pub namespace: String,

    /// Set to `false` to keep the image local (single-node clusters that
    /// share the build engine's image store).
    #[serde(default = "default_push")]
    pub push: bool,

    #[serde(default)]
    pub auth: Option<RegistryAuth>,
}

fn default_push() -> bool {
    true
}

impl RegistryConfig {
    /// Resolve env-sourced credentials at load time so nothing later in the
    /// run touches the process environment.
    pub fn resolve_auth(&mut self) -> Result<(), ConfigError> {
        if let Some(ref mut auth) = self.auth {
            auth.password = auth.password.resolve()?;
        }
        Ok(())
    }
}

/// Registry credentials. The password is typically an `env:` reference.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryAuth {
    pub username: String,
    pub password: EnvValue,
}

impl RegistryAuth {
    /// The resolved password, if it resolved to a literal.
    pub fn password_value(&self) -> Option<&str> {
        match &self.password {
            EnvValue::Literal(s) => Some(s),
            _ => None,
        }
    }
}

/// Which kind of workload the manifests describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    /// A long-running, self-healing replica set behind a service.
    #[default]
    Deployment,
    /// A single-run job, for batch-style invocations of the same app.
    Job,
}

/// Target cluster and namespace.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    pub namespace: String,

    /// Path to a kubeconfig file. Unset means the standard loader chain
    /// (`$KUBECONFIG`, then `~/.kube/config`, then in-cluster).
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to select. Unset means the current context.
    #[serde(default)]
    pub context: Option<String>,

    #[serde(default)]
    pub workload: WorkloadKind,
}
