// ABOUTME: Image operations trait for build engines.
// ABOUTME: Build from a tar context, retag, and push to a remote registry.

use super::error::{BuildError, PushError};
use super::sealed::Sealed;
use crate::types::ImageRef;
use async_trait::async_trait;
use bytes::Bytes;

/// Parameters for one image build.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Tag applied to the built image.
    pub tag: ImageRef,
    /// Name of the build description file inside the context.
    pub containerfile: String,
    /// Target platform, e.g. `linux/amd64`.
    pub platform: Option<String>,
}

/// Registry credentials handed to the engine for a push.
#[derive(Debug, Clone)]
pub struct RegistryAuth {
    pub username: String,
    pub password: String,
    pub server: Option<String>,
}

/// Image operations: build, retag, push.
#[async_trait]
pub trait ImageOps: Sealed + Send + Sync {
    /// Build an image from a tar context. Returns the content-addressed
    /// image id from the local store.
    async fn build_image(
        &self,
        request: &BuildRequest,
        context: Bytes,
    ) -> Result<String, BuildError>;

    /// Apply an additional reference to an existing local image.
    async fn tag_image(&self, source: &ImageRef, target: &ImageRef) -> Result<(), PushError>;

    /// Upload an image to its registry. Layers already present remotely are
    /// skipped by the engine (content-addressed dedup).
    async fn push_image(
        &self,
        reference: &ImageRef,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), PushError>;
}
