// ABOUTME: ImageBuilder: validates the source tree and drives the engine.
// ABOUTME: build(spec) -> BuildArtifact, failing with BuildError on any step.

use super::BuildArtifact;
use super::containerfile::{CONTAINERFILE_NAME, requirements_file, synthesize};
use super::context::build_context;
use crate::config::DeploymentSpec;
use crate::engine::{BuildError, BuildRequest, ImageOps};

/// Turns a deployment spec into a locally tagged container image.
pub struct ImageBuilder<'e, E: ImageOps> {
    engine: &'e E,
}

impl<'e, E: ImageOps> ImageBuilder<'e, E> {
    pub fn new(engine: &'e E) -> Self {
        Self { engine }
    }

    /// Build and tag `{app}:{tag}`. The local image store is mutated as a
    /// side effect; nothing leaves the machine.
    pub async fn build(&self, spec: &DeploymentSpec) -> Result<BuildArtifact, BuildError> {
        let source = spec.build.source.as_path();
        if !source.is_dir() {
            return Err(BuildError::SourceMissing(source.to_path_buf()));
        }

        let entrypoint = source.join(&spec.build.entrypoint);
        if !entrypoint.is_file() {
            return Err(BuildError::EntrypointMissing(entrypoint));
        }

        let reference = spec
            .local_image()
            .map_err(|e| BuildError::Config(e.to_string()))?;

        let containerfile = synthesize(spec);
        let requirements = requirements_file(&spec.build.requirements);
        let context = build_context(source, &containerfile, &requirements)?;

        tracing::info!(image = %reference, "building image");

        let request = BuildRequest {
            tag: reference.clone(),
            containerfile: CONTAINERFILE_NAME.to_string(),
            platform: spec.build.platform.clone(),
        };

        let id = self.engine.build_image(&request, context).await?;

        Ok(BuildArtifact { id, reference })
    }
}
