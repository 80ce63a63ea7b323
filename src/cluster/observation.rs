// ABOUTME: Transient rollout state polled from the control plane.
// ABOUTME: Desired vs ready vs available replicas, with an observation time.

use chrono::{DateTime, Utc};

/// One polled snapshot of a workload's convergence state. Used only to
/// decide when to stop polling; nothing is cached across observations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloutObservation {
    pub desired: i32,
    pub ready: i32,
    pub available: i32,
    pub observed_at: DateTime<Utc>,
}

impl RolloutObservation {
    pub fn new(desired: i32, ready: i32, available: i32) -> Self {
        Self {
            desired,
            ready,
            available,
            observed_at: Utc::now(),
        }
    }

    /// Every desired replica is ready.
    pub fn is_complete(&self) -> bool {
        self.ready >= self.desired
    }
}

/// The result of waiting on a rollout. A timeout is a value, not an error:
/// the workload stays applied and may still converge later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloutOutcome {
    Ready(RolloutObservation),
    TimedOut(RolloutObservation),
}

impl RolloutOutcome {
    pub fn observation(&self) -> &RolloutObservation {
        match self {
            RolloutOutcome::Ready(obs) | RolloutOutcome::TimedOut(obs) => obs,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, RolloutOutcome::Ready(_))
    }
}
