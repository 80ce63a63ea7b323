// ABOUTME: RegistryPublisher: push(artifact, registry) -> fully-qualified ref.
// ABOUTME: Tags registry/namespace/image:tag and uploads with retries.

use crate::build::BuildArtifact;
use crate::config::RegistryConfig;
use crate::engine::{ImageOps, PushError, RegistryAuth};
use crate::types::ImageRef;
use std::time::Duration;

/// Bounded retry with exponential backoff for push attempts.
///
/// Every push error, auth included, is retried up to the attempt bound
/// before surfacing.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Publishes a built artifact to a remote registry.
pub struct RegistryPublisher<'e, E: ImageOps> {
    engine: &'e E,
    policy: RetryPolicy,
}

impl<'e, E: ImageOps> RegistryPublisher<'e, E> {
    pub fn new(engine: &'e E) -> Self {
        Self {
            engine,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(engine: &'e E, policy: RetryPolicy) -> Self {
        Self { engine, policy }
    }

    /// Retag the artifact under `registry/namespace/…` and upload it.
    /// Returns the fully-qualified reference the cluster will pull.
    pub async fn push(
        &self,
        artifact: &BuildArtifact,
        registry: &RegistryConfig,
    ) -> Result<ImageRef, PushError> {
        let qualified = artifact
            .reference
            .qualified(&registry.url, &registry.namespace);

        self.engine.tag_image(&artifact.reference, &qualified).await?;

        let auth = registry.auth.as_ref().map(|a| RegistryAuth {
            username: a.username.clone(),
            password: a.password_value().unwrap_or_default().to_string(),
            server: Some(registry.url.clone()),
        });

        let mut attempt = 0;
        loop {
            match self.engine.push_image(&qualified, auth.as_ref()).await {
                Ok(()) => {
                    tracing::info!(image = %qualified, "image pushed");
                    return Ok(qualified);
                }
                Err(e) if attempt + 1 < self.policy.attempts => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        image = %qualified,
                        error = %e,
                        "push attempt {} failed, retrying in {:?}",
                        attempt + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
