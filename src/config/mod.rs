// ABOUTME: Deployment specification types and parsing for helmsman.yml.
// ABOUTME: Handles YAML parsing, env resolution, and fail-fast validation.

mod env_value;
mod error;
mod probes;
mod registry;
mod resources;

pub use env_value::{EnvValue, resolve_env_map};
pub use error::ConfigError;
pub use probes::ProbeConfig;
pub use registry::{ClusterConfig, RegistryAuth, RegistryConfig, WorkloadKind};
pub use resources::{Quantity, ResourceSet, ResourcesConfig};

use crate::error::{Error, Result};
use crate::types::{AppName, ImageRef};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "helmsman.yml";
pub const CONFIG_FILENAME_ALT: &str = "helmsman.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".helmsman/config.yml";

/// The immutable input of one deploy run.
///
/// Constructed once per invocation via [`DeploymentSpec::load`] (or
/// [`DeploymentSpec::from_yaml`] in tests), validated before any side
/// effect, and never mutated afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentSpec {
    #[serde(deserialize_with = "deserialize_app_name")]
    pub app: AppName,

    /// Image tag. Defaults to the current git short revision at load time.
    #[serde(default)]
    pub tag: Option<String>,

    #[serde(default = "default_replicas")]
    pub replicas: u32,

    pub port: u16,

    pub build: BuildConfig,

    #[serde(default)]
    pub registry: Option<RegistryConfig>,

    pub cluster: ClusterConfig,

    #[serde(default)]
    pub env: HashMap<String, EnvValue>,

    #[serde(default)]
    pub resources: Option<ResourcesConfig>,

    #[serde(default)]
    pub readiness: Option<ProbeConfig>,

    #[serde(default)]
    pub liveness: Option<ProbeConfig>,

    #[serde(default)]
    pub image_pull_secrets: Vec<String>,

    #[serde(default)]
    pub budgets: BudgetsConfig,
}

/// How the container image is produced from the source directory.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    #[serde(deserialize_with = "deserialize_image_ref")]
    pub base_image: ImageRef,

    #[serde(deserialize_with = "deserialize_requirements")]
    pub requirements: NonEmpty<String>,

    #[serde(default = "default_source")]
    pub source: PathBuf,

    pub entrypoint: String,

    #[serde(default)]
    pub platform: Option<String>,
}

/// Per-stage time budgets. Each stage gets an independent budget so a slow
/// registry cannot starve the rollout wait.
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetsConfig {
    #[serde(default = "default_build_budget", with = "humantime_serde")]
    pub build: Duration,

    #[serde(default = "default_push_budget", with = "humantime_serde")]
    pub push: Duration,

    #[serde(default = "default_rollout_budget", with = "humantime_serde")]
    pub rollout: Duration,

    #[serde(default = "default_url_budget", with = "humantime_serde")]
    pub url: Duration,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for BudgetsConfig {
    fn default() -> Self {
        Self {
            build: default_build_budget(),
            push: default_push_budget(),
            rollout: default_rollout_budget(),
            url: default_url_budget(),
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_replicas() -> u32 {
    1
}

fn default_source() -> PathBuf {
    PathBuf::from(".")
}

fn default_build_budget() -> Duration {
    Duration::from_secs(600)
}

fn default_push_budget() -> Duration {
    Duration::from_secs(300)
}

fn default_rollout_budget() -> Duration {
    Duration::from_secs(180)
}

fn default_url_budget() -> Duration {
    Duration::from_secs(30)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(3)
}

impl DeploymentSpec {
    /// Parse and validate a spec from YAML. Env references are resolved here,
    /// so the returned spec is self-contained.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut spec: DeploymentSpec = serde_yaml::from_str(yaml)?;
        spec.env = resolve_env_map(&spec.env).map_err(Error::from)?;
        if let Some(ref mut registry) = spec.registry {
            registry.resolve_auth().map_err(Error::from)?;
        }
        spec.validate().map_err(Error::from)?;
        Ok(spec)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Cross-field invariants, checked once at construction so every failure
    /// here happens before any side effect.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.replicas < 1 {
            return Err(ConfigError::ZeroReplicas);
        }

        if self.port == 0 {
            return Err(ConfigError::ZeroPort);
        }

        if let Some(ref resources) = self.resources {
            resources.validate()?;
        }

        // A liveness probe firing before the workload has ever been ready
        // restarts pods that were never given a chance to come up.
        if let (Some(readiness), Some(liveness)) = (&self.readiness, &self.liveness)
            && liveness.initial_delay < readiness.initial_delay
        {
            return Err(ConfigError::LivenessBeforeReadiness {
                liveness: liveness.initial_delay,
                readiness: readiness.initial_delay,
            });
        }

        if let Some(ref registry) = self.registry
            && registry.push
            && registry.url.is_empty()
        {
            return Err(ConfigError::EmptyRegistryUrl);
        }

        Ok(())
    }

    /// The tag for this run: the configured tag, or the git short revision of
    /// the source directory.
    pub fn image_tag(&self) -> std::result::Result<String, ConfigError> {
        if let Some(ref tag) = self.tag {
            return Ok(tag.clone());
        }
        git_short_rev(&self.build.source).ok_or(ConfigError::NoImageTag)
    }

    /// The local (pre-push) image reference, `{app}:{tag}`.
    pub fn local_image(&self) -> std::result::Result<ImageRef, ConfigError> {
        let tag = self.image_tag()?;
        ImageRef::local(self.app.as_str(), &tag)
            .map_err(|e| ConfigError::Image(e.to_string()))
    }

    /// Whether this run publishes the image to a remote registry.
    pub fn pushes_to_registry(&self) -> bool {
        self.registry.as_ref().is_some_and(|r| r.push)
    }

    pub fn template() -> Self {
        DeploymentSpec {
            app: AppName::new("my-app").expect("template app name is valid"),
            tag: None,
            replicas: 2,
            port: 8080,
            build: BuildConfig {
                base_image: ImageRef::parse("python:3.10-slim-bookworm")
                    .expect("template base image is valid"),
                requirements: NonEmpty::new("fastapi".to_string()),
                source: PathBuf::from("."),
                entrypoint: "app.py".to_string(),
                platform: None,
            },
            registry: None,
            cluster: ClusterConfig {
                namespace: "default".to_string(),
                kubeconfig: None,
                context: None,
                workload: WorkloadKind::Deployment,
            },
            env: HashMap::new(),
            resources: None,
            readiness: None,
            liveness: None,
            image_pull_secrets: Vec::new(),
            budgets: BudgetsConfig::default(),
        }
    }
}

fn git_short_rev(dir: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .current_dir(dir)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let rev = String::from_utf8(output.stdout).ok()?.trim().to_string();
    if rev.is_empty() { None } else { Some(rev) }
}

pub fn init_config(dir: &Path, app: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut spec = DeploymentSpec::template();

    if let Some(name) = app {
        spec.app = AppName::new(name).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    }

    std::fs::write(&config_path, generate_template_yaml(&spec))?;

    Ok(())
}

fn generate_template_yaml(spec: &DeploymentSpec) -> String {
    format!(
        r#"app: {app}
replicas: {replicas}
port: {port}

build:
  base_image: {base_image}
  requirements:
    - fastapi
    - uvicorn
  entrypoint: {entrypoint}

cluster:
  namespace: {namespace}

# registry:
#   url: registry.example.com
#   namespace: my-team

readiness:
  path: /health
  initial_delay: 10s
  period: 5s

liveness:
  path: /health
  initial_delay: 30s
  period: 10s
"#,
        app = spec.app,
        replicas = spec.replicas,
        port = spec.port,
        base_image = spec.build.base_image,
        entrypoint = spec.build.entrypoint,
        namespace = spec.cluster.namespace,
    )
}

// Custom deserializers

fn deserialize_app_name<'de, D>(deserializer: D) -> std::result::Result<AppName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    AppName::new(&s).map_err(serde::de::Error::custom)
}

fn deserialize_image_ref<'de, D>(deserializer: D) -> std::result::Result<ImageRef, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ImageRef::parse(&s).map_err(serde::de::Error::custom)
}

fn deserialize_requirements<'de, D>(
    deserializer: D,
) -> std::result::Result<NonEmpty<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<String> = Vec::deserialize(deserializer)?;
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(serde::de::Error::custom(
            "requirements entries cannot be blank",
        ));
    }
    NonEmpty::from_vec(values)
        .ok_or_else(|| serde::de::Error::custom("at least one requirement is needed"))
}
