// ABOUTME: Status command implementation.
// ABOUTME: One-shot rollout observation and service address lookup.

use helmsman::cluster::{ClusterOps, KubeApplier};
use helmsman::config::{DeploymentSpec, WorkloadKind};
use helmsman::deploy::DeployError;
use helmsman::error::{Error, Result};
use helmsman::output::Output;
use helmsman::types::{ResourceKey, ResourceKind};

/// Print one rollout observation for the configured workload, plus the
/// service's external address if the load balancer has assigned one.
pub async fn status(spec: DeploymentSpec, output: Output) -> Result<()> {
    let applier = KubeApplier::connect(&spec.cluster)
        .await
        .map_err(|e| Error::Deploy(DeployError::from(e)))?;

    let namespace = spec.cluster.namespace.clone();
    let workload_key = match spec.cluster.workload {
        WorkloadKind::Deployment => ResourceKey::new(
            ResourceKind::Deployment,
            namespace.clone(),
            spec.app.to_string(),
        ),
        WorkloadKind::Job => ResourceKey::new(
            ResourceKind::Job,
            namespace.clone(),
            format!("{}-{}", spec.app, spec.image_tag()?),
        ),
    };

    let observation = applier
        .rollout_status(&workload_key)
        .await
        .map_err(|e| Error::Deploy(DeployError::from(e)))?;

    output.success(&format!(
        "{}: {}/{} ready ({} available), observed {}",
        workload_key.name,
        observation.ready,
        observation.desired,
        observation.available,
        observation.observed_at.format("%Y-%m-%dT%H:%M:%SZ"),
    ));

    let service_key = ResourceKey::new(ResourceKind::Service, namespace, spec.app.to_string());
    match applier.service_ingress(&service_key).await {
        Ok(Some(address)) => {
            output.progress(&format!("Service URL: http://{}:{}", address, spec.port));
        }
        Ok(None) => {
            output.progress("Service URL: pending");
        }
        Err(e) => {
            tracing::debug!(error = %e, "no service ingress available");
        }
    }

    Ok(())
}
