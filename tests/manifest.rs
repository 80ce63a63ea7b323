// ABOUTME: Integration tests for manifest rendering.
// ABOUTME: Determinism, selector/label agreement, and resource shapes.

use helmsman::config::{
    DeploymentSpec, EnvValue, ProbeConfig, Quantity, ResourceSet, ResourcesConfig, WorkloadKind,
};
use helmsman::manifest::{self, ClusterResourceSet, Workload};
use helmsman::types::{AppName, ImageRef, ResourceKind};
use k8s_openapi::api::apps::v1::Deployment;
use proptest::prelude::*;
use std::time::Duration;

fn stock_agent_spec() -> DeploymentSpec {
    let mut spec = DeploymentSpec::template();
    spec.app = AppName::new("stock-agent").unwrap();
    spec.tag = Some("v1.0".to_string());
    spec.replicas = 2;
    spec.port = 8080;
    spec.cluster.namespace = "agentscope-stock".to_string();
    spec.resources = Some(ResourcesConfig {
        requests: ResourceSet {
            cpu: Quantity::parse("500m").unwrap(),
            memory: Quantity::parse("1Gi").unwrap(),
        },
        limits: ResourceSet {
            cpu: Quantity::parse("2000m").unwrap(),
            memory: Quantity::parse("4Gi").unwrap(),
        },
    });
    spec.readiness = Some(ProbeConfig {
        path: "/health".to_string(),
        port: None,
        initial_delay: Duration::from_secs(10),
        period: Duration::from_secs(5),
        failure_threshold: 3,
    });
    spec.liveness = Some(ProbeConfig {
        path: "/health".to_string(),
        port: None,
        initial_delay: Duration::from_secs(30),
        period: Duration::from_secs(10),
        failure_threshold: 3,
    });
    spec.image_pull_secrets = vec!["regcred".to_string()];
    spec.env.insert(
        "PYTHONPATH".to_string(),
        EnvValue::Literal("/app".to_string()),
    );
    spec.env.insert(
        "DASHSCOPE_API_KEY".to_string(),
        EnvValue::SecretRef {
            secret: "stock-agent-secrets".to_string(),
            key: "api-key".to_string(),
        },
    );
    spec
}

fn image() -> ImageRef {
    ImageRef::parse("registry.example.com/agentscope-runtime/stock-agent:v1.0").unwrap()
}

fn deployment(resources: &ClusterResourceSet) -> &Deployment {
    match &resources.workload {
        Workload::Deployment(d) => d,
        Workload::Job(_) => panic!("expected a deployment workload"),
    }
}

mod rendering {
    use super::*;

    #[test]
    fn scenario_produces_expected_workload_and_service() {
        let spec = stock_agent_spec();
        let rendered = manifest::render(&spec, &image());

        let workload = deployment(&rendered);
        let workload_spec = workload.spec.as_ref().unwrap();
        assert_eq!(workload_spec.replicas, Some(2));

        let pod_spec = workload_spec.template.spec.as_ref().unwrap();
        assert_eq!(pod_spec.containers.len(), 1);
        let container = &pod_spec.containers[0];
        assert_eq!(
            container.image.as_deref(),
            Some("registry.example.com/agentscope-runtime/stock-agent:v1.0")
        );
        let ports = container.ports.as_ref().unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].container_port, 8080);

        let readiness = container.readiness_probe.as_ref().unwrap();
        assert_eq!(readiness.initial_delay_seconds, Some(10));
        assert_eq!(
            readiness.http_get.as_ref().unwrap().path.as_deref(),
            Some("/health")
        );
        let liveness = container.liveness_probe.as_ref().unwrap();
        assert_eq!(liveness.initial_delay_seconds, Some(30));

        let requests = container
            .resources
            .as_ref()
            .unwrap()
            .requests
            .as_ref()
            .unwrap();
        assert_eq!(requests["cpu"].0, "500m");
        assert_eq!(requests["memory"].0, "1Gi");

        let service_spec = rendered.service.spec.as_ref().unwrap();
        assert_eq!(service_spec.type_.as_deref(), Some("LoadBalancer"));
        let ports = service_spec.ports.as_ref().unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].port, 8080);

        assert_eq!(
            Some(pod_spec.image_pull_secrets.as_ref().unwrap()[0].name.as_str()),
            Some("regcred")
        );
    }

    #[test]
    fn selector_matches_pod_labels_exactly() {
        let rendered = manifest::render(&stock_agent_spec(), &image());
        let selector = rendered
            .service
            .spec
            .as_ref()
            .unwrap()
            .selector
            .clone()
            .unwrap();
        assert_eq!(rendered.workload.pod_labels(), selector);

        let match_labels = deployment(&rendered)
            .spec
            .as_ref()
            .unwrap()
            .selector
            .match_labels
            .clone()
            .unwrap();
        assert_eq!(match_labels, selector);
    }

    #[test]
    fn env_entries_are_sorted_and_secret_refs_bind_secrets() {
        let rendered = manifest::render(&stock_agent_spec(), &image());
        let container = &deployment(&rendered)
            .spec
            .as_ref()
            .unwrap()
            .template
            .spec
            .as_ref()
            .unwrap()
            .containers[0];

        let env = container.env.as_ref().unwrap();
        let names: Vec<&str> = env.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["DASHSCOPE_API_KEY", "PYTHONPATH"]);

        let secret_ref = env[0]
            .value_from
            .as_ref()
            .unwrap()
            .secret_key_ref
            .as_ref()
            .unwrap();
        assert_eq!(Some(secret_ref.name.as_str()), Some("stock-agent-secrets"));
        assert_eq!(secret_ref.key, "api-key");
        assert_eq!(env[1].value.as_deref(), Some("/app"));
    }

    #[test]
    fn render_is_deterministic() {
        let spec = stock_agent_spec();
        let first = manifest::render(&spec, &image());
        let second = manifest::render(&spec, &image());

        assert_eq!(
            serde_json::to_value(deployment(&first)).unwrap(),
            serde_json::to_value(deployment(&second)).unwrap()
        );
        assert_eq!(
            serde_json::to_value(&first.service).unwrap(),
            serde_json::to_value(&second.service).unwrap()
        );
        assert_eq!(
            serde_json::to_value(&first.namespace).unwrap(),
            serde_json::to_value(&second.namespace).unwrap()
        );
    }

    #[test]
    fn keys_cover_all_three_resources() {
        let rendered = manifest::render(&stock_agent_spec(), &image());
        let keys = rendered.keys();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0].kind, ResourceKind::Namespace);
        assert_eq!(keys[1].kind, ResourceKind::Deployment);
        assert_eq!(keys[1].name, "stock-agent");
        assert_eq!(keys[1].namespace, "agentscope-stock");
        assert_eq!(keys[2].kind, ResourceKind::Service);
    }
}

mod job_path {
    use super::*;

    #[test]
    fn job_workload_renders_single_run_semantics() {
        let mut spec = stock_agent_spec();
        spec.cluster.workload = WorkloadKind::Job;
        let rendered = manifest::render(&spec, &image());

        let job = match &rendered.workload {
            Workload::Job(j) => j,
            Workload::Deployment(_) => panic!("expected a job workload"),
        };

        // The name carries the tag: a finished job's template is immutable,
        // so each image version is its own run.
        assert_eq!(job.metadata.name.as_deref(), Some("stock-agent-v1.0"));

        let job_spec = job.spec.as_ref().unwrap();
        assert_eq!(job_spec.completions, Some(1));
        assert_eq!(
            job_spec
                .template
                .spec
                .as_ref()
                .unwrap()
                .restart_policy
                .as_deref(),
            Some("Never")
        );
    }

    #[test]
    fn job_service_still_selects_pod_labels() {
        let mut spec = stock_agent_spec();
        spec.cluster.workload = WorkloadKind::Job;
        let rendered = manifest::render(&spec, &image());

        let selector = rendered
            .service
            .spec
            .as_ref()
            .unwrap()
            .selector
            .clone()
            .unwrap();
        assert_eq!(rendered.workload.pod_labels(), selector);
    }
}

proptest! {
    #[test]
    fn selector_always_matches_pod_labels(
        name in "[a-z][a-z0-9-]{0,20}[a-z0-9]",
        port in 1u16..=65535,
        replicas in 1u32..50,
    ) {
        let mut spec = DeploymentSpec::template();
        spec.app = AppName::new(&name).unwrap();
        spec.tag = Some("v1".to_string());
        spec.port = port;
        spec.replicas = replicas;

        let image = ImageRef::local(&name, "v1").unwrap();
        let rendered = manifest::render(&spec, &image);

        let selector = rendered.service.spec.as_ref().unwrap().selector.clone().unwrap();
        prop_assert_eq!(rendered.workload.pod_labels(), selector);
    }

    #[test]
    fn render_twice_is_identical(
        name in "[a-z][a-z0-9-]{0,20}[a-z0-9]",
        port in 1u16..=65535,
    ) {
        let mut spec = DeploymentSpec::template();
        spec.app = AppName::new(&name).unwrap();
        spec.tag = Some("v1".to_string());
        spec.port = port;

        let image = ImageRef::local(&name, "v1").unwrap();
        let first = manifest::render(&spec, &image);
        let second = manifest::render(&spec, &image);

        prop_assert_eq!(
            serde_json::to_value(&first.service).unwrap(),
            serde_json::to_value(&second.service).unwrap()
        );
        prop_assert_eq!(
            serde_json::to_value(&first.namespace).unwrap(),
            serde_json::to_value(&second.namespace).unwrap()
        );
    }
}
