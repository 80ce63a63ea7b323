// ABOUTME: Deploy command implementation.
// ABOUTME: Wires engine and cluster clients into the orchestrator.

use helmsman::cluster::KubeApplier;
use helmsman::config::DeploymentSpec;
use helmsman::deploy::{DeployError, DeployErrorKind, DeployStatus, Orchestrator, ServiceUrl};
use helmsman::engine::BollardEngine;
use helmsman::error::{Error, Result};
use helmsman::output::Output;

/// Run the full build-push-apply-wait pipeline against the configured
/// cluster, printing progress and a remediation hint on failure.
pub async fn deploy(spec: DeploymentSpec, mut output: Output) -> Result<()> {
    output.start_timer();
    output.progress(&format!(
        "Deploying {} to namespace {} ({} replica(s))",
        spec.app, spec.cluster.namespace, spec.replicas
    ));

    let engine = BollardEngine::connect_local()
        .map_err(|e| Error::Deploy(DeployError::from(e)))?;
    engine
        .ping()
        .await
        .map_err(|e| Error::Deploy(DeployError::from(e)))?;

    let applier = KubeApplier::connect(&spec.cluster)
        .await
        .map_err(|e| Error::Deploy(DeployError::from(e)))?;

    let orchestrator = Orchestrator::new(&engine, &applier).with_events(&output);

    match orchestrator.deploy(spec).await {
        Ok(result) => {
            match result.status {
                DeployStatus::Succeeded => {
                    output.success(&format!(
                        "  ✓ Deployed {} in {}",
                        result.workload, result.namespace
                    ));
                    match &result.url {
                        ServiceUrl::Resolved(url) => {
                            output.progress(&format!("  Service URL: {url}"));
                        }
                        ServiceUrl::Pending => {
                            output.progress(
                                "  Service URL: pending (load balancer still provisioning)",
                            );
                        }
                    }
                }
                DeployStatus::TimedOut => {
                    output.success(&format!(
                        "  ⧗ {} applied, rollout still converging",
                        result.workload
                    ));
                    output.progress("  Check progress later with: helmsman status");
                }
            }
            Ok(())
        }
        Err(e) => {
            if let DeployError::Build {
                source: helmsman::engine::BuildError::EngineFailed { log_tail, .. },
            } = &e
            {
                for line in log_tail {
                    eprintln!("  {line}");
                }
            }
            output.hint(remediation(&e));
            Err(e.into())
        }
    }
}

/// Targeted guidance per error kind. Presentation only; the orchestrator
/// never carries user-facing text.
fn remediation(error: &DeployError) -> &'static str {
    match error.kind() {
        DeployErrorKind::Config => "fix helmsman.yml and re-run",
        DeployErrorKind::Build => "check the build engine is running: docker info",
        DeployErrorKind::Push => "check registry access: docker login <registry-url>",
        DeployErrorKind::Apply => "check cluster access: kubectl cluster-info",
    }
}
