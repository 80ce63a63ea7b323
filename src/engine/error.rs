// ABOUTME: Error types for build engine operations.
// ABOUTME: Build failures carry the captured log tail for diagnosis.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from producing a local image.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("source path does not exist: {0}")]
    SourceMissing(PathBuf),

    #[error("entrypoint file not found in source: {0}")]
    EntrypointMissing(PathBuf),

    #[error("failed to assemble build context: {0}")]
    Context(String),

    #[error("build engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("image build failed: {message}")]
    EngineFailed {
        message: String,
        /// Last lines of the engine's build log.
        log_tail: Vec<String>,
    },

    #[error("built image not found in local store: {0}")]
    MissingImage(String),

    #[error("image build timed out after {0} seconds")]
    TimedOut(u64),

    #[error("invalid build configuration: {0}")]
    Config(String),
}

/// Errors from publishing an image to a registry.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("failed to tag image: {0}")]
    TagFailed(String),

    #[error("authentication failed for registry: {0}")]
    AuthenticationFailed(String),

    #[error("push failed: {0}")]
    Failed(String),

    #[error("push timed out after {0} seconds")]
    TimedOut(u64),
}
