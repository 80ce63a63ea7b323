// ABOUTME: Cluster operations trait: namespace, apply, rollout, ingress.
// ABOUTME: wait_ready is a polling loop provided on top of rollout_status.

use super::error::ApplyError;
use super::observation::{RolloutObservation, RolloutOutcome};
use super::sealed::Sealed;
use crate::manifest::ClusterResourceSet;
use crate::types::ResourceKey;
use async_trait::async_trait;
use std::time::Duration;

/// Control-plane operations for one target cluster.
#[async_trait]
pub trait ClusterOps: Sealed + Send + Sync {
    /// Create the namespace if it does not exist. Creating an existing
    /// namespace is a no-op success, not an error.
    async fn ensure_namespace(&self, name: &str) -> Result<(), ApplyError>;

    /// Create-or-update every resource in the set. Existing resources get
    /// their mutable fields updated in place; immutable fields are never
    /// attempted. Returns the keys of the applied resources.
    async fn apply(&self, resources: &ClusterResourceSet) -> Result<Vec<ResourceKey>, ApplyError>;

    /// One snapshot of the workload's rollout state.
    async fn rollout_status(&self, key: &ResourceKey) -> Result<RolloutObservation, ApplyError>;

    /// The externally reachable address of the service's load balancer, if
    /// the cluster has assigned one yet.
    async fn service_ingress(&self, key: &ResourceKey) -> Result<Option<String>, ApplyError>;

    /// Poll rollout status until every desired replica is ready or the
    /// budget elapses. A timeout is returned as a value so the caller
    /// decides whether it is fatal.
    async fn wait_ready(
        &self,
        key: &ResourceKey,
        timeout: Duration,
        interval: Duration,
    ) -> Result<RolloutOutcome, ApplyError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let observation = self.rollout_status(key).await?;
            if observation.is_complete() {
                return Ok(RolloutOutcome::Ready(observation));
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(RolloutOutcome::TimedOut(observation));
            }
            tokio::time::sleep(interval.min(deadline - tokio::time::Instant::now())).await;
        }
    }

    /// Poll for an assigned load-balancer address within the budget.
    /// `None` means provisioning is still pending, not a failure.
    async fn wait_for_ingress(
        &self,
        key: &ResourceKey,
        timeout: Duration,
        interval: Duration,
    ) -> Result<Option<String>, ApplyError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(address) = self.service_ingress(key).await? {
                return Ok(Some(address));
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(interval.min(deadline - tokio::time::Instant::now())).await;
        }
    }
}
