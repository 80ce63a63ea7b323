// ABOUTME: Render command implementation.
// ABOUTME: Prints the cluster manifests as YAML without touching the cluster.

use helmsman::config::DeploymentSpec;
use helmsman::error::Result;
use helmsman::manifest::{self, Workload};
use helmsman::types::ImageRef;
use serde::Serialize;

/// Render the namespace, workload, and service manifests to stdout as a
/// multi-document YAML stream, exactly as `deploy` would apply them.
pub fn render(spec: DeploymentSpec) -> Result<()> {
    let image = target_image(&spec)?;
    let resources = manifest::render(&spec, &image);

    let workload_yaml = match &resources.workload {
        Workload::Deployment(deployment) => to_manifest_yaml(deployment.as_ref())?,
        Workload::Job(job) => to_manifest_yaml(job.as_ref())?,
    };

    print!(
        "{}---\n{}---\n{}",
        to_manifest_yaml(&resources.namespace)?,
        workload_yaml,
        to_manifest_yaml(&resources.service)?
    );

    Ok(())
}

/// The typed resources carry apiVersion/kind in the trait, not in fields;
/// put them back so the output is appliable as-is.
fn to_manifest_yaml<T: k8s_openapi::Resource + Serialize>(resource: &T) -> Result<String> {
    let mut value = serde_json::to_value(resource)?;
    if let serde_json::Value::Object(ref mut map) = value {
        map.insert("apiVersion".to_string(), T::API_VERSION.into());
        map.insert("kind".to_string(), T::KIND.into());
    }
    Ok(serde_yaml::to_string(&value)?)
}

/// The reference the cluster would pull: the registry-qualified path when
/// pushing, the local tag otherwise.
fn target_image(spec: &DeploymentSpec) -> Result<ImageRef> {
    let local = spec.local_image()?;
    Ok(match &spec.registry {
        Some(registry) if registry.push => local.qualified(&registry.url, &registry.namespace),
        _ => local,
    })
}
