// ABOUTME: The deploy façade: build, push, apply, await ready, resolve URL.
// ABOUTME: Owns per-stage budgets and emits progress events to a sink.

use crate::cluster::{ClusterOps, RolloutOutcome};
use crate::config::DeploymentSpec;
use crate::engine::{BuildError, ImageOps, PushError};

use super::error::DeployError;
use super::events::{EventSink, NullSink, Stage};
use super::result::{DeployStatus, DeploymentResult, ServiceUrl};
use super::run::Run;

static NULL_SINK: NullSink = NullSink;

/// Coordinates one deploy run end to end.
///
/// Holds its collaborators as explicit references so callers (and tests) can
/// run multiple isolated orchestrators side by side. One orchestrator call
/// executes strictly sequentially; concurrent calls for the same app name
/// race on the cluster API and must be serialized by the caller.
pub struct Orchestrator<'a, E: ImageOps, C: ClusterOps> {
    engine: &'a E,
    cluster: &'a C,
    events: &'a dyn EventSink,
}

impl<'a, E: ImageOps, C: ClusterOps> Orchestrator<'a, E, C> {
    pub fn new(engine: &'a E, cluster: &'a C) -> Self {
        Self {
            engine,
            cluster,
            events: &NULL_SINK,
        }
    }

    /// Subscribe a sink to stage progress and failures.
    pub fn with_events(mut self, events: &'a dyn EventSink) -> Self {
        self.events = events;
        self
    }

    /// Run the full pipeline. Later stages never start before the prior
    /// stage's result is known; each stage has its own time budget so a slow
    /// registry cannot starve the rollout wait.
    ///
    /// # Errors
    ///
    /// Returns a classified [`DeployError`] naming the failed stage. A
    /// rollout that does not converge in budget is not an error; it returns
    /// a result with [`DeployStatus::TimedOut`].
    pub async fn deploy(&self, spec: DeploymentSpec) -> Result<DeploymentResult, DeployError> {
        let run = Run::new(spec).map_err(|e| self.fail(e.into()))?;

        self.events.on_stage_start(Stage::Building);
        let budget = run.spec().budgets.build;
        let run = match tokio::time::timeout(budget, run.build(self.engine)).await {
            Ok(built) => built.map_err(|e| self.fail(e.into()))?,
            Err(_) => {
                return Err(self.fail(BuildError::TimedOut(budget.as_secs()).into()));
            }
        };
        self.events.on_stage_complete(Stage::Building);

        self.events.on_stage_start(Stage::Pushing);
        let budget = run.spec().budgets.push;
        let run = match tokio::time::timeout(budget, run.push(self.engine)).await {
            Ok(pushed) => pushed.map_err(|e| self.fail(e.into()))?,
            Err(_) => {
                return Err(self.fail(PushError::TimedOut(budget.as_secs()).into()));
            }
        };
        self.events.on_stage_complete(Stage::Pushing);

        self.events.on_stage_start(Stage::Applying);
        let run = run
            .apply(self.cluster)
            .await
            .map_err(|e| self.fail(e.into()))?;
        self.events.on_stage_complete(Stage::Applying);

        self.events.on_stage_start(Stage::AwaitingReady);
        let outcome = run
            .await_ready(self.cluster)
            .await
            .map_err(|e| self.fail(DeployError::Rollout { source: e }))?;

        let workload_key = run.workload_key();
        let image = run
            .image()
            .cloned()
            .expect("applied run has an image");

        match outcome {
            RolloutOutcome::Ready(observation) => {
                self.events.on_stage_complete(Stage::AwaitingReady);
                tracing::info!(
                    ready = observation.ready,
                    desired = observation.desired,
                    "rollout complete"
                );

                let url = run.resolve_url(self.cluster).await;

                Ok(DeploymentResult {
                    status: DeployStatus::Succeeded,
                    url,
                    workload: workload_key.name,
                    namespace: workload_key.namespace,
                    image,
                })
            }
            RolloutOutcome::TimedOut(observation) => {
                // Not a failure: the resources stay applied and the workload
                // may converge later. The caller decides what to do.
                tracing::warn!(
                    ready = observation.ready,
                    desired = observation.desired,
                    "rollout did not converge within budget"
                );

                Ok(DeploymentResult {
                    status: DeployStatus::TimedOut,
                    url: ServiceUrl::Pending,
                    workload: workload_key.name,
                    namespace: workload_key.namespace,
                    image,
                })
            }
        }
    }

    fn fail(&self, error: DeployError) -> DeployError {
        self.events.on_error(&error);
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ApplyError, RolloutObservation};
    use crate::deploy::DeployErrorKind;
    use crate::engine::{BuildRequest, RegistryAuth};
    use crate::manifest::ClusterResourceSet;
    use crate::types::{ImageRef, ResourceKey};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeEngine {
        fail_build: bool,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeEngine {
        fn new() -> Self {
            Self {
                fail_build: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail_build: true,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl crate::engine::sealed::Sealed for FakeEngine {}

    #[async_trait]
    impl ImageOps for FakeEngine {
        async fn build_image(
            &self,
            _request: &BuildRequest,
            _context: Bytes,
        ) -> Result<String, BuildError> {
            self.calls.lock().unwrap().push("build");
            if self.fail_build {
                return Err(BuildError::EngineFailed {
                    message: "exit status 1".to_string(),
                    log_tail: vec!["pip install failed".to_string()],
                });
            }
            Ok("sha256:deadbeef".to_string())
        }

        async fn tag_image(&self, _source: &ImageRef, _target: &ImageRef) -> Result<(), PushError> {
            self.calls.lock().unwrap().push("tag");
            Ok(())
        }

        async fn push_image(
            &self,
            _reference: &ImageRef,
            _auth: Option<&RegistryAuth>,
        ) -> Result<(), PushError> {
            self.calls.lock().unwrap().push("push");
            Ok(())
        }
    }

    struct FakeCluster {
        desired: i32,
        ready_after_polls: usize,
        polls: AtomicUsize,
        apply_calls: AtomicUsize,
        namespace_calls: AtomicUsize,
        ingress: Option<String>,
    }

    impl FakeCluster {
        fn ready(desired: i32) -> Self {
            Self {
                desired,
                ready_after_polls: 0,
                polls: AtomicUsize::new(0),
                apply_calls: AtomicUsize::new(0),
                namespace_calls: AtomicUsize::new(0),
                ingress: Some("203.0.113.7".to_string()),
            }
        }

        fn never_ready(desired: i32) -> Self {
            Self {
                desired,
                ready_after_polls: usize::MAX,
                polls: AtomicUsize::new(0),
                apply_calls: AtomicUsize::new(0),
                namespace_calls: AtomicUsize::new(0),
                ingress: None,
            }
        }
    }

    impl crate::cluster::sealed::Sealed for FakeCluster {}

    #[async_trait]
    impl ClusterOps for FakeCluster {
        async fn ensure_namespace(&self, _name: &str) -> Result<(), ApplyError> {
            self.namespace_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn apply(
            &self,
            resources: &ClusterResourceSet,
        ) -> Result<Vec<ResourceKey>, ApplyError> {
            self.apply_calls.fetch_add(1, Ordering::SeqCst);
            Ok(resources.keys())
        }

        async fn rollout_status(
            &self,
            _key: &ResourceKey,
        ) -> Result<RolloutObservation, ApplyError> {
            let poll = self.polls.fetch_add(1, Ordering::SeqCst);
            let ready = if poll >= self.ready_after_polls {
                self.desired
            } else {
                0
            };
            Ok(RolloutObservation::new(self.desired, ready, ready))
        }

        async fn service_ingress(&self, _key: &ResourceKey) -> Result<Option<String>, ApplyError> {
            Ok(self.ingress.clone())
        }
    }

    struct RecordingSink {
        events: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl EventSink for RecordingSink {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start:{stage}"));
        }

        fn on_stage_complete(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("done:{stage}"));
        }

        fn on_error(&self, error: &DeployError) {
            self.events.lock().unwrap().push(format!("error:{error}"));
        }
    }

    fn test_spec(source: &Path) -> DeploymentSpec {
        let mut spec = DeploymentSpec::template();
        spec.tag = Some("v1".to_string());
        spec.build.source = source.to_path_buf();
        spec.budgets.rollout = Duration::from_millis(100);
        spec.budgets.url = Duration::from_millis(50);
        spec.budgets.poll_interval = Duration::from_millis(10);
        spec
    }

    fn source_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.py"), "print('ok')\n").unwrap();
        dir
    }

    #[tokio::test]
    async fn full_run_succeeds_with_resolved_url() {
        let dir = source_dir();
        let engine = FakeEngine::new();
        let cluster = FakeCluster::ready(2);
        let sink = RecordingSink::new();

        let result = Orchestrator::new(&engine, &cluster)
            .with_events(&sink)
            .deploy(test_spec(dir.path()))
            .await
            .unwrap();

        assert_eq!(result.status, DeployStatus::Succeeded);
        assert_eq!(result.workload, "my-app");
        assert_eq!(result.namespace, "default");
        assert_eq!(
            result.url,
            ServiceUrl::Resolved("http://203.0.113.7:8080".to_string())
        );
        assert_eq!(
            sink.events(),
            vec![
                "start:building",
                "done:building",
                "start:pushing",
                "done:pushing",
                "start:applying",
                "done:applying",
                "start:awaiting ready",
                "done:awaiting ready",
            ]
        );
    }

    #[tokio::test]
    async fn zero_replicas_fails_before_any_side_effect() {
        let dir = source_dir();
        let engine = FakeEngine::new();
        let cluster = FakeCluster::ready(2);

        let mut spec = test_spec(dir.path());
        spec.replicas = 0;

        let error = Orchestrator::new(&engine, &cluster)
            .deploy(spec)
            .await
            .unwrap_err();

        assert_eq!(error.kind(), DeployErrorKind::Config);
        assert_eq!(error.stage(), None);
        assert!(engine.calls().is_empty());
        assert_eq!(cluster.apply_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn build_failure_stops_the_pipeline() {
        let dir = source_dir();
        let engine = FakeEngine::failing();
        let cluster = FakeCluster::ready(2);
        let sink = RecordingSink::new();

        let error = Orchestrator::new(&engine, &cluster)
            .with_events(&sink)
            .deploy(test_spec(dir.path()))
            .await
            .unwrap_err();

        assert_eq!(error.kind(), DeployErrorKind::Build);
        assert_eq!(error.stage(), Some(Stage::Building));
        assert_eq!(engine.calls(), vec!["build"]);
        assert_eq!(cluster.apply_calls.load(Ordering::SeqCst), 0);
        assert!(sink.events().iter().any(|e| e.starts_with("error:")));
    }

    #[tokio::test]
    async fn rollout_timeout_is_a_result_not_an_error() {
        let dir = source_dir();
        let engine = FakeEngine::new();
        let cluster = FakeCluster::never_ready(2);

        let result = Orchestrator::new(&engine, &cluster)
            .deploy(test_spec(dir.path()))
            .await
            .unwrap();

        assert_eq!(result.status, DeployStatus::TimedOut);
        assert_eq!(result.url, ServiceUrl::Pending);
        // The workload stayed applied; only the wait was abandoned.
        assert_eq!(cluster.apply_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn timed_out_rollout_can_still_converge_later() {
        let dir = source_dir();
        let engine = FakeEngine::new();
        // Becomes ready on the twentieth poll, far past the deploy budget.
        let cluster = FakeCluster {
            desired: 2,
            ready_after_polls: 20,
            polls: AtomicUsize::new(0),
            apply_calls: AtomicUsize::new(0),
            namespace_calls: AtomicUsize::new(0),
            ingress: None,
        };

        let result = Orchestrator::new(&engine, &cluster)
            .deploy(test_spec(dir.path()))
            .await
            .unwrap();
        assert_eq!(result.status, DeployStatus::TimedOut);

        // The same resource, waited on again with a fresh budget, succeeds:
        // a timeout is not a cluster-level failure.
        let key = crate::types::ResourceKey::new(
            crate::types::ResourceKind::Deployment,
            result.namespace,
            result.workload,
        );
        let outcome = cluster
            .wait_ready(&key, Duration::from_secs(5), Duration::from_millis(5))
            .await
            .unwrap();
        assert!(outcome.is_ready());
    }

    #[tokio::test]
    async fn push_is_skipped_without_a_registry() {
        let dir = source_dir();
        let engine = FakeEngine::new();
        let cluster = FakeCluster::ready(2);

        let result = Orchestrator::new(&engine, &cluster)
            .deploy(test_spec(dir.path()))
            .await
            .unwrap();

        assert_eq!(engine.calls(), vec!["build"]);
        assert_eq!(result.image.to_string(), "my-app:v1");
    }

    #[tokio::test]
    async fn push_publishes_under_the_registry_path() {
        let dir = source_dir();
        let engine = FakeEngine::new();
        let cluster = FakeCluster::ready(2);

        let mut spec = test_spec(dir.path());
        spec.registry = Some(crate::config::RegistryConfig {
            url: "registry.example.com".to_string(),
            namespace: "team".to_string(),
            push: true,
            auth: None,
        });

        let result = Orchestrator::new(&engine, &cluster)
            .deploy(spec)
            .await
            .unwrap();

        assert_eq!(engine.calls(), vec!["build", "tag", "push"]);
        assert_eq!(
            result.image.to_string(),
            "registry.example.com/team/my-app:v1"
        );
    }

    #[tokio::test]
    async fn rerun_converges_instead_of_duplicating() {
        let dir = source_dir();
        let engine = FakeEngine::new();
        let cluster = FakeCluster::ready(3);

        let orchestrator = Orchestrator::new(&engine, &cluster);

        let first = orchestrator.deploy(test_spec(dir.path())).await.unwrap();

        let mut scaled = test_spec(dir.path());
        scaled.replicas = 3;
        let second = orchestrator.deploy(scaled).await.unwrap();

        // Same stable names on both runs; the second apply updates in place.
        assert_eq!(first.workload, second.workload);
        assert_eq!(cluster.namespace_calls.load(Ordering::SeqCst), 2);
        assert_eq!(cluster.apply_calls.load(Ordering::SeqCst), 2);
    }
}
