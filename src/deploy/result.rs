// ABOUTME: The value a deploy run returns to its caller.
// ABOUTME: Service URL (possibly pending), workload identity, final status.

use std::fmt;

use crate::types::ImageRef;

/// The externally reachable address of the deployed service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceUrl {
    Resolved(String),
    /// The load balancer had no address within budget; it may appear later.
    Pending,
}

impl fmt::Display for ServiceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceUrl::Resolved(url) => write!(f, "{url}"),
            ServiceUrl::Pending => write!(f, "<pending>"),
        }
    }
}

/// Terminal status of a run that did not fail outright.
///
/// `TimedOut` means the rollout did not converge within budget; the
/// resources remain applied and the workload may still become healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStatus {
    Succeeded,
    TimedOut,
}

/// The only value that outlives a deploy call.
#[derive(Debug, Clone)]
pub struct DeploymentResult {
    pub status: DeployStatus,
    pub url: ServiceUrl,
    pub workload: String,
    pub namespace: String,
    pub image: ImageRef,
}
