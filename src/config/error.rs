// ABOUTME: Validation errors for deployment specifications.
// ABOUTME: All of these are raised before any side effect is attempted.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("replica count must be at least 1")]
    ZeroReplicas,

    #[error("port must be in the range 1-65535")]
    ZeroPort,

    #[error("resource limit for {resource} ({limit}) is below the request ({request})")]
    LimitBelowRequest {
        resource: &'static str,
        request: String,
        limit: String,
    },

    #[error(
        "liveness initial delay ({liveness:?}) is shorter than readiness initial delay ({readiness:?})"
    )]
    LivenessBeforeReadiness {
        liveness: Duration,
        readiness: Duration,
    },

    #[error("registry url cannot be empty when pushing")]
    EmptyRegistryUrl,

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("no image tag configured and the source directory is not a git work tree")]
    NoImageTag,

    #[error("invalid image reference: {0}")]
    Image(String),

    #[error("invalid quantity: {0}")]
    Quantity(String),
}
