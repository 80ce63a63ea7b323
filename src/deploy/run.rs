// ABOUTME: Generic deploy run struct parameterized by state marker.
// ABOUTME: Later stages cannot start before earlier results exist.

use std::marker::PhantomData;

use crate::build::BuildArtifact;
use crate::config::{ConfigError, DeploymentSpec};
use crate::manifest::ClusterResourceSet;
use crate::types::ImageRef;

use super::state::Validated;

/// A deploy run in progress, parameterized by its current state.
///
/// The phantom state parameter `S` makes stage order a compile-time
/// property: `push()` exists only after `build()` produced an artifact, and
/// `await_ready()` only after `apply()` rendered and applied resources.
#[derive(Debug)]
pub struct Run<S> {
    pub(crate) spec: DeploymentSpec,
    pub(crate) artifact: Option<BuildArtifact>,
    pub(crate) image: Option<ImageRef>,
    pub(crate) resources: Option<ClusterResourceSet>,
    pub(crate) _state: PhantomData<S>,
}

impl Run<Validated> {
    /// Validate the spec and open a run. This is the only entry point, so
    /// every run that exists has passed validation before any side effect.
    pub fn new(spec: DeploymentSpec) -> Result<Self, ConfigError> {
        spec.validate()?;
        Ok(Run {
            spec,
            artifact: None,
            image: None,
            resources: None,
            _state: PhantomData,
        })
    }
}

impl<S> Run<S> {
    pub fn spec(&self) -> &DeploymentSpec {
        &self.spec
    }

    /// The build artifact, present from `ImageBuilt` onwards.
    pub fn artifact(&self) -> Option<&BuildArtifact> {
        self.artifact.as_ref()
    }

    /// The image reference the cluster pulls, present from `ImagePushed`
    /// onwards.
    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }
}
