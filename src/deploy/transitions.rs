// ABOUTME: State transition methods for the deploy run.
// ABOUTME: Each method consumes self and returns the next state on success.

use std::marker::PhantomData;

use crate::build::ImageBuilder;
use crate::cluster::{ApplyError, ClusterOps, RolloutOutcome};
use crate::engine::{BuildError, ImageOps, PushError};
use crate::manifest;
use crate::registry::RegistryPublisher;
use crate::types::ResourceKey;

use super::Run;
use super::result::ServiceUrl;
use super::state::{ImageBuilt, ImagePushed, ResourcesApplied, Validated};

impl<S> Run<S> {
    /// Internal helper to transition to a new state.
    fn transition<T>(self) -> Run<T> {
        Run {
            spec: self.spec,
            artifact: self.artifact,
            image: self.image,
            resources: self.resources,
            _state: PhantomData,
        }
    }
}

// =============================================================================
// Validated -> ImageBuilt
// =============================================================================

impl Run<Validated> {
    /// Build the container image from the spec's source directory.
    ///
    /// # Errors
    ///
    /// Returns `BuildError` if the source tree is incomplete or the engine
    /// reports a failure.
    #[must_use = "run state must be used"]
    pub async fn build<E: ImageOps>(self, engine: &E) -> Result<Run<ImageBuilt>, BuildError> {
        let artifact = ImageBuilder::new(engine).build(&self.spec).await?;
        let mut run: Run<ImageBuilt> = self.transition();
        run.artifact = Some(artifact);
        Ok(run)
    }
}

// =============================================================================
// ImageBuilt -> ImagePushed
// =============================================================================

impl Run<ImageBuilt> {
    /// Publish the artifact to the configured registry, or keep the local
    /// reference when the spec opts out of pushing.
    ///
    /// # Errors
    ///
    /// Returns `PushError` after the publisher's retries are exhausted.
    #[must_use = "run state must be used"]
    pub async fn push<E: ImageOps>(self, engine: &E) -> Result<Run<ImagePushed>, PushError> {
        let artifact = self.artifact.as_ref().expect("built run has an artifact");

        let image = match &self.spec.registry {
            Some(registry) if registry.push => {
                RegistryPublisher::new(engine).push(artifact, registry).await?
            }
            _ => {
                tracing::debug!(image = %artifact.reference, "registry push disabled");
                artifact.reference.clone()
            }
        };

        let mut run: Run<ImagePushed> = self.transition();
        run.image = Some(image);
        Ok(run)
    }
}

// =============================================================================
// ImagePushed -> ResourcesApplied
// =============================================================================

impl Run<ImagePushed> {
    /// Render the resource set and converge the cluster onto it: namespace
    /// first, then workload and service.
    ///
    /// # Errors
    ///
    /// Returns `ApplyError` if the control plane rejects any resource.
    #[must_use = "run state must be used"]
    pub async fn apply<C: ClusterOps>(self, cluster: &C) -> Result<Run<ResourcesApplied>, ApplyError> {
        let image = self.image.as_ref().expect("pushed run has an image");

        let resources = manifest::render(&self.spec, image);

        cluster.ensure_namespace(resources.namespace_name()).await?;
        cluster.apply(&resources).await?;

        let mut run: Run<ResourcesApplied> = self.transition();
        run.resources = Some(resources);
        Ok(run)
    }
}

// =============================================================================
// ResourcesApplied - terminal stage operations
// =============================================================================

impl Run<ResourcesApplied> {
    fn resources(&self) -> &crate::manifest::ClusterResourceSet {
        self.resources.as_ref().expect("applied run has resources")
    }

    pub fn workload_key(&self) -> ResourceKey {
        self.resources().workload_key()
    }

    pub fn service_key(&self) -> ResourceKey {
        self.resources().service_key()
    }

    /// Poll until every desired replica is ready or the rollout budget
    /// elapses. A timeout is a value; the resources stay applied.
    ///
    /// # Errors
    ///
    /// Returns `ApplyError` if rollout status cannot be read at all.
    pub async fn await_ready<C: ClusterOps>(&self, cluster: &C) -> Result<RolloutOutcome, ApplyError> {
        cluster
            .wait_ready(
                &self.workload_key(),
                self.spec.budgets.rollout,
                self.spec.budgets.poll_interval,
            )
            .await
    }

    /// Resolve the externally reachable URL. Load-balancer provisioning is
    /// asynchronous, so an unassigned address within budget is `Pending`,
    /// not a failure.
    pub async fn resolve_url<C: ClusterOps>(&self, cluster: &C) -> ServiceUrl {
        let result = cluster
            .wait_for_ingress(
                &self.service_key(),
                self.spec.budgets.url,
                self.spec.budgets.poll_interval,
            )
            .await;

        match result {
            Ok(Some(address)) => ServiceUrl::Resolved(format!("http://{}:{}", address, self.spec.port)),
            Ok(None) => ServiceUrl::Pending,
            Err(e) => {
                tracing::warn!(error = %e, "could not read service ingress");
                ServiceUrl::Pending
            }
        }
    }
}
