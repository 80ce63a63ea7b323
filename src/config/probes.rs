// ABOUTME: HTTP probe configuration for readiness and liveness checks.
// ABOUTME: Probes reference an endpoint the deployed app must serve with 2xx.

use serde::Deserialize;
use std::time::Duration;

/// An HTTP GET probe against the container.
///
/// The port defaults to the app's declared port when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    pub path: String,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default = "default_initial_delay", with = "humantime_serde")]
    pub initial_delay: Duration,

    #[serde(default = "default_period", with = "humantime_serde")]
    pub period: Duration,

    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_period() -> Duration {
    Duration::from_secs(5)
}

fn default_failure_threshold() -> u32 {
    3
}
