// ABOUTME: Classified deploy error with SNAFU pattern.
// ABOUTME: Unifies per-stage failures for programmatic handling.

use snafu::Snafu;

use crate::cluster::ApplyError;
use crate::config::ConfigError;
use crate::engine::{BuildError, PushError};

use super::events::Stage;

/// Unified error for a failed deploy run. Every variant names its stage so
/// callers can print targeted remediation without string matching.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DeployError {
    #[snafu(display("invalid deployment spec: {source}"))]
    Config { source: ConfigError },

    #[snafu(display("image build failed: {source}"))]
    Build { source: BuildError },

    #[snafu(display("registry push failed: {source}"))]
    Push { source: PushError },

    #[snafu(display("cluster apply failed: {source}"))]
    Apply { source: ApplyError },

    #[snafu(display("rollout status unavailable: {source}"))]
    Rollout { source: ApplyError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    /// The spec is invalid; nothing was attempted.
    Config,
    /// The build engine failed or is unreachable.
    Build,
    /// The registry rejected the upload after retries.
    Push,
    /// The control plane rejected a resource or is unreachable.
    Apply,
}

impl DeployError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Config { .. } => DeployErrorKind::Config,
            DeployError::Build { .. } => DeployErrorKind::Build,
            DeployError::Push { .. } => DeployErrorKind::Push,
            DeployError::Apply { .. } | DeployError::Rollout { .. } => DeployErrorKind::Apply,
        }
    }

    /// The stage the failure originated in. `None` for config errors, which
    /// are raised before the run starts.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            DeployError::Config { .. } => None,
            DeployError::Build { .. } => Some(Stage::Building),
            DeployError::Push { .. } => Some(Stage::Pushing),
            DeployError::Apply { .. } => Some(Stage::Applying),
            DeployError::Rollout { .. } => Some(Stage::AwaitingReady),
        }
    }
}

impl From<ConfigError> for DeployError {
    fn from(source: ConfigError) -> Self {
        DeployError::Config { source }
    }
}

impl From<BuildError> for DeployError {
    fn from(source: BuildError) -> Self {
        DeployError::Build { source }
    }
}

impl From<PushError> for DeployError {
    fn from(source: PushError) -> Self {
        DeployError::Push { source }
    }
}

impl From<ApplyError> for DeployError {
    fn from(source: ApplyError) -> Self {
        DeployError::Apply { source }
    }
}
