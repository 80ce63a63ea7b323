// ABOUTME: Bollard-based build engine implementation.
// ABOUTME: Drives image build, tag, and push through the Docker-compatible API.

use super::error::{BuildError, PushError};
use super::sealed::Sealed;
use super::traits::{BuildRequest, ImageOps, RegistryAuth};
use crate::types::ImageRef;
use async_trait::async_trait;
use bollard::Docker;
use bollard::auth::DockerCredentials;
use bollard::query_parameters::{
    BuildImageOptionsBuilder, PushImageOptionsBuilder, TagImageOptionsBuilder,
};
use bytes::Bytes;
use futures::StreamExt;

/// How many build log lines are kept for error reporting.
const LOG_TAIL_LINES: usize = 25;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_push_error(e: bollard::errors::Error, image_name: &str) -> PushError {
    match &e {
        bollard::errors::Error::DockerResponseServerError { status_code, message }
            if *status_code == 401 || *status_code == 403 =>
        {
            PushError::AuthenticationFailed(format!("{image_name}: {message}"))
        }
        _ => PushError::Failed(format!("{image_name}: {e}")),
    }
}

fn classify_push_stream_error(message: &str, image_name: &str) -> PushError {
    let lower = message.to_lowercase();
    if lower.contains("unauthorized") || lower.contains("denied") || lower.contains("authentication")
    {
        PushError::AuthenticationFailed(format!("{image_name}: {message}"))
    } else {
        PushError::Failed(format!("{image_name}: {message}"))
    }
}

// =============================================================================
// BollardEngine
// =============================================================================

/// Build engine backed by a local Docker-compatible daemon.
///
/// Works with Docker and with Podman's Docker-compatible socket.
pub struct BollardEngine {
    client: Docker,
}

impl BollardEngine {
    /// Create an engine from an already-connected client.
    pub fn new(client: Docker) -> Self {
        Self { client }
    }

    /// Connect using the environment's defaults (`DOCKER_HOST` or the
    /// platform socket path).
    pub fn connect_local() -> Result<Self, BuildError> {
        let client = Docker::connect_with_local_defaults()
            .map_err(|e| BuildError::EngineUnavailable(e.to_string()))?;
        Ok(Self::new(client))
    }

    /// Verify the daemon answers before starting a run.
    pub async fn ping(&self) -> Result<(), BuildError> {
        self.client
            .ping()
            .await
            .map_err(|e| BuildError::EngineUnavailable(e.to_string()))?;
        Ok(())
    }
}

impl Sealed for BollardEngine {}

#[async_trait]
impl ImageOps for BollardEngine {
    async fn build_image(
        &self,
        request: &BuildRequest,
        context: Bytes,
    ) -> Result<String, BuildError> {
        let tag = request.tag.to_string();

        let mut options = BuildImageOptionsBuilder::default()
            .dockerfile(&request.containerfile)
            .t(&tag);
        if let Some(ref platform) = request.platform {
            options = options.platform(platform);
        }

        let mut stream =
            self.client
                .build_image(options.build(), None, Some(bollard::body_full(context)));

        // The build API streams progress lines; keep a rolling tail so a
        // failure can show what the engine was doing when it died.
        let mut log_tail: Vec<String> = Vec::new();
        while let Some(item) = stream.next().await {
            let info = item.map_err(|e| BuildError::EngineFailed {
                message: e.to_string(),
                log_tail: log_tail.clone(),
            })?;

            if let Some(line) = info.stream {
                let line = line.trim_end();
                if !line.is_empty() {
                    tracing::debug!(target: "helmsman::build", "{line}");
                    if log_tail.len() == LOG_TAIL_LINES {
                        log_tail.remove(0);
                    }
                    log_tail.push(line.to_string());
                }
            }

            if let Some(error) = info.error_detail.and_then(|d| d.message) {
                return Err(BuildError::EngineFailed {
                    message: error,
                    log_tail,
                });
            }
        }

        // The stream does not reliably surface the image id; read it back
        // from the local store by tag.
        let inspect = self
            .client
            .inspect_image(&tag)
            .await
            .map_err(|e| BuildError::MissingImage(format!("{tag}: {e}")))?;

        inspect.id.ok_or_else(|| BuildError::MissingImage(tag))
    }

    async fn tag_image(&self, source: &ImageRef, target: &ImageRef) -> Result<(), PushError> {
        let repo = match target.registry() {
            Some(registry) => format!("{}/{}", registry, target.repository()),
            None => target.repository().to_string(),
        };

        let mut options = TagImageOptionsBuilder::default().repo(&repo);
        if let Some(tag) = target.tag() {
            options = options.tag(tag);
        }

        self.client
            .tag_image(&source.to_string(), Some(options.build()))
            .await
            .map_err(|e| PushError::TagFailed(format!("{source} -> {target}: {e}")))
    }

    async fn push_image(
        &self,
        reference: &ImageRef,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), PushError> {
        let repo = match reference.registry() {
            Some(registry) => format!("{}/{}", registry, reference.repository()),
            None => reference.repository().to_string(),
        };

        let mut options = PushImageOptionsBuilder::default();
        if let Some(tag) = reference.tag() {
            options = options.tag(tag);
        }

        let credentials = auth.map(|a| DockerCredentials {
            username: Some(a.username.clone()),
            password: Some(a.password.clone()),
            serveraddress: a.server.clone(),
            ..Default::default()
        });

        let mut stream = self
            .client
            .push_image(&repo, Some(options.build()), credentials);

        let name = reference.to_string();
        while let Some(item) = stream.next().await {
            let info = item.map_err(|e| map_push_error(e, &name))?;
            if let Some(error) = info.error_detail.and_then(|d| d.message) {
                return Err(classify_push_stream_error(&error, &name));
            }
        }

        Ok(())
    }
}
