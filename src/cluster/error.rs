// ABOUTME: Error types for control-plane operations.
// ABOUTME: Distinguishes connection, permission, and rejection failures.

use crate::types::ResourceKey;
use thiserror::Error;

/// Errors from applying resources or reading their status.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("cluster connection failed: {0}")]
    Connection(String),

    #[error("permission denied for {key}: {message}")]
    Forbidden { key: ResourceKey, message: String },

    #[error("control plane rejected {key}: {message}")]
    Rejected { key: ResourceKey, message: String },

    #[error("resource not found: {0}")]
    NotFound(ResourceKey),

    #[error("failed to read status of {key}: {message}")]
    Status { key: ResourceKey, message: String },
}
