// ABOUTME: Registry publishing: retag under the remote path and upload.
// ABOUTME: Push failures are retried with bounded exponential backoff.

mod publisher;

pub use publisher::{RegistryPublisher, RetryPolicy};
