// ABOUTME: Tests for deploy run state transitions.
// ABOUTME: Verifies transition methods exist and return correct state types.

use helmsman::cluster::{ApplyError, ClusterOps, RolloutOutcome};
use helmsman::config::DeploymentSpec;
use helmsman::deploy::{ImageBuilt, ImagePushed, ResourcesApplied, Run, ServiceUrl, Validated};
use helmsman::engine::{BuildError, ImageOps, PushError};

// =============================================================================
// Transition Type Signature Tests
// =============================================================================

/// Test: Verifies the type signatures of all transition methods compile
/// correctly. This ensures the state machine is wired up properly at compile
/// time: push() needs a built run, apply() a pushed run, await_ready() an
/// applied run.
#[test]
fn transition_type_signatures_compile() {
    // This function is never called, but it must compile.
    // If any type signature is wrong, this will fail to compile.
    #[allow(dead_code)]
    async fn check_signatures<E: ImageOps, C: ClusterOps>(engine: &E, cluster: &C) {
        let spec = DeploymentSpec::template();

        // Validated is the only entry point
        let run: Run<Validated> = Run::new(spec).unwrap();

        // Validated -> ImageBuilt
        let built: Result<Run<ImageBuilt>, BuildError> = run.build(engine).await;

        // ImageBuilt -> ImagePushed
        let pushed: Result<Run<ImagePushed>, PushError> = built.unwrap().push(engine).await;

        // ImagePushed -> ResourcesApplied
        let applied: Result<Run<ResourcesApplied>, ApplyError> =
            pushed.unwrap().apply(cluster).await;
        let applied = applied.unwrap();

        // ResourcesApplied: wait and URL resolution borrow the run
        let outcome: Result<RolloutOutcome, ApplyError> = applied.await_ready(cluster).await;
        let _ = outcome;
        let _url: ServiceUrl = applied.resolve_url(cluster).await;
    }
}

/// Test: A fresh run carries no artifact or image until the stages produce
/// them.
#[test]
fn new_run_has_no_stage_outputs() {
    let run = Run::new(DeploymentSpec::template()).unwrap();
    assert!(run.artifact().is_none());
    assert!(run.image().is_none());
}

/// Test: Validation failures prevent a run from existing at all.
#[test]
fn invalid_spec_never_becomes_a_run() {
    let mut spec = DeploymentSpec::template();
    spec.replicas = 0;
    assert!(Run::new(spec).is_err());
}
