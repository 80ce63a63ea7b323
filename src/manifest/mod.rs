// ABOUTME: Pure manifest rendering from a deployment spec.
// ABOUTME: Produces typed Namespace, Deployment/Job, and Service resources.

use crate::config::{DeploymentSpec, EnvValue, ProbeConfig, WorkloadKind};
use crate::types::{ImageRef, ResourceKey, ResourceKind};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec as K8sDeploymentSpec};
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, EnvVarSource, HTTPGetAction, LocalObjectReference,
    Namespace, PodSpec, PodTemplateSpec, Probe, ResourceRequirements, SecretKeySelector, Service,
    ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity as K8sQuantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const MANAGER: &str = "helmsman";

/// The rendered workload, deployment-style or single-run.
#[derive(Debug, Clone)]
pub enum Workload {
    Deployment(Box<Deployment>),
    Job(Box<Job>),
}

impl Workload {
    pub fn name(&self) -> &str {
        let name = match self {
            Workload::Deployment(d) => d.metadata.name.as_deref(),
            Workload::Job(j) => j.metadata.name.as_deref(),
        };
        name.unwrap_or_default()
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Workload::Deployment(_) => ResourceKind::Deployment,
            Workload::Job(_) => ResourceKind::Job,
        }
    }

    /// Labels on the pod template, which the service selector must match.
    pub fn pod_labels(&self) -> BTreeMap<String, String> {
        let meta = match self {
            Workload::Deployment(d) => {
                d.spec.as_ref().and_then(|s| s.template.metadata.as_ref())
            }
            Workload::Job(j) => j.spec.as_ref().and_then(|s| s.template.metadata.as_ref()),
        };
        meta.and_then(|m| m.labels.clone()).unwrap_or_default()
    }
}

/// The resources of one deploy, generated fresh per render call. Names are
/// stable across calls so re-applying converges instead of duplicating.
#[derive(Debug, Clone)]
pub struct ClusterResourceSet {
    pub namespace: Namespace,
    pub workload: Workload,
    pub service: Service,
}

impl ClusterResourceSet {
    pub fn namespace_name(&self) -> &str {
        self.namespace.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn keys(&self) -> Vec<ResourceKey> {
        let ns = self.namespace_name().to_string();
        vec![
            ResourceKey::new(ResourceKind::Namespace, "", self.namespace_name()),
            ResourceKey::new(self.workload.kind(), ns.clone(), self.workload.name()),
            ResourceKey::new(
                ResourceKind::Service,
                ns,
                self.service.metadata.name.as_deref().unwrap_or_default(),
            ),
        ]
    }

    pub fn workload_key(&self) -> ResourceKey {
        ResourceKey::new(
            self.workload.kind(),
            self.namespace_name(),
            self.workload.name(),
        )
    }

    pub fn service_key(&self) -> ResourceKey {
        ResourceKey::new(
            ResourceKind::Service,
            self.namespace_name(),
            self.service.metadata.name.as_deref().unwrap_or_default(),
        )
    }
}

/// Render the full resource set for a spec and a resolved image reference.
///
/// Pure and deterministic: the same spec and image yield byte-identical
/// resources, and the service selector is derived from the same label set as
/// the pod template (a mismatch would produce a service with zero endpoints).
pub fn render(spec: &DeploymentSpec, image: &ImageRef) -> ClusterResourceSet {
    let selector = selector_labels(spec);
    let labels = resource_labels(spec);
    let namespace_name = spec.cluster.namespace.clone();

    let namespace = Namespace {
        metadata: ObjectMeta {
            name: Some(namespace_name.clone()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        ..Default::default()
    };

    let pod_template = render_pod_template(spec, image, &selector);

    let workload = match spec.cluster.workload {
        WorkloadKind::Deployment => Workload::Deployment(Box::new(Deployment {
            metadata: ObjectMeta {
                name: Some(spec.app.to_string()),
                namespace: Some(namespace_name.clone()),
                labels: Some(labels.clone()),
                ..Default::default()
            },
            spec: Some(K8sDeploymentSpec {
                replicas: Some(spec.replicas as i32),
                selector: LabelSelector {
                    match_labels: Some(selector.clone()),
                    ..Default::default()
                },
                template: pod_template,
                ..Default::default()
            }),
            ..Default::default()
        })),
        WorkloadKind::Job => {
            let mut template = pod_template;
            if let Some(ref mut pod_spec) = template.spec {
                // Jobs must not restart in place; the controller reschedules.
                pod_spec.restart_policy = Some("Never".to_string());
            }
            Workload::Job(Box::new(Job {
                metadata: ObjectMeta {
                    name: Some(job_name(spec, image)),
                    namespace: Some(namespace_name.clone()),
                    labels: Some(labels.clone()),
                    ..Default::default()
                },
                spec: Some(JobSpec {
                    parallelism: Some(1),
                    completions: Some(1),
                    backoff_limit: Some(3),
                    template,
                    ..Default::default()
                }),
                ..Default::default()
            }))
        }
    };

    let service = Service {
        metadata: ObjectMeta {
            name: Some(spec.app.to_string()),
            namespace: Some(namespace_name),
            labels: Some(labels),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("LoadBalancer".to_string()),
            selector: Some(selector),
            ports: Some(vec![ServicePort {
                name: Some("http".to_string()),
                port: spec.port as i32,
                target_port: Some(IntOrString::Int(spec.port as i32)),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    };

    ClusterResourceSet {
        namespace,
        workload,
        service,
    }
}

/// The one label set both the pod template and the service selector use.
pub fn selector_labels(spec: &DeploymentSpec) -> BTreeMap<String, String> {
    BTreeMap::from([("app".to_string(), spec.app.to_string())])
}

fn resource_labels(spec: &DeploymentSpec) -> BTreeMap<String, String> {
    let mut labels = selector_labels(spec);
    labels.insert(MANAGED_BY_LABEL.to_string(), MANAGER.to_string());
    labels
}

/// A Job is one run of one image; its name carries the tag so distinct runs
/// do not collide with the immutable template of a finished job.
fn job_name(spec: &DeploymentSpec, image: &ImageRef) -> String {
    match image.tag() {
        Some(tag) => format!("{}-{}", spec.app, tag),
        None => spec.app.to_string(),
    }
}

fn render_pod_template(
    spec: &DeploymentSpec,
    image: &ImageRef,
    selector: &BTreeMap<String, String>,
) -> PodTemplateSpec {
    let container = Container {
        name: spec.app.to_string(),
        image: Some(image.to_string()),
        ports: Some(vec![ContainerPort {
            container_port: spec.port as i32,
            name: Some("http".to_string()),
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]),
        env: render_env(spec),
        resources: render_resources(spec),
        readiness_probe: spec.readiness.as_ref().map(|p| render_probe(p, spec.port)),
        liveness_probe: spec.liveness.as_ref().map(|p| render_probe(p, spec.port)),
        ..Default::default()
    };

    let image_pull_secrets = if spec.image_pull_secrets.is_empty() {
        None
    } else {
        Some(
            spec.image_pull_secrets
                .iter()
                .map(|name| LocalObjectReference {
                    name: name.clone(),
                })
                .collect(),
        )
    };

    PodTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: Some(selector.clone()),
            ..Default::default()
        }),
        spec: Some(PodSpec {
            containers: vec![container],
            image_pull_secrets,
            ..Default::default()
        }),
    }
}

fn render_env(spec: &DeploymentSpec) -> Option<Vec<EnvVar>> {
    if spec.env.is_empty() {
        return None;
    }

    // Sorted by name so rendering is deterministic regardless of map order.
    let mut names: Vec<&String> = spec.env.keys().collect();
    names.sort();

    let vars = names
        .into_iter()
        .map(|name| {
            match &spec.env[name] {
                EnvValue::Literal(value) => EnvVar {
                    name: name.clone(),
                    value: Some(value.clone()),
                    ..Default::default()
                },
                EnvValue::SecretRef { secret, key } => EnvVar {
                    name: name.clone(),
                    value_from: Some(EnvVarSource {
                        secret_key_ref: Some(SecretKeySelector {
                            name: secret.clone(),
                            key: key.clone(),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                // Resolved to a literal at config load; a leftover reference
                // renders as its default so this function stays free of I/O.
                EnvValue::FromEnv { default, .. } => EnvVar {
                    name: name.clone(),
                    value: Some(default.clone().unwrap_or_default()),
                    ..Default::default()
                },
            }
        })
        .collect();

    Some(vars)
}

fn render_resources(spec: &DeploymentSpec) -> Option<ResourceRequirements> {
    spec.resources.as_ref().map(|r| ResourceRequirements {
        requests: Some(BTreeMap::from([
            (
                "cpu".to_string(),
                K8sQuantity(r.requests.cpu.as_str().to_string()),
            ),
            (
                "memory".to_string(),
                K8sQuantity(r.requests.memory.as_str().to_string()),
            ),
        ])),
        limits: Some(BTreeMap::from([
            (
                "cpu".to_string(),
                K8sQuantity(r.limits.cpu.as_str().to_string()),
            ),
            (
                "memory".to_string(),
                K8sQuantity(r.limits.memory.as_str().to_string()),
            ),
        ])),
        ..Default::default()
    })
}

fn render_probe(probe: &ProbeConfig, default_port: u16) -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(probe.path.clone()),
            port: IntOrString::Int(probe.port.unwrap_or(default_port) as i32),
            ..Default::default()
        }),
        initial_delay_seconds: Some(probe.initial_delay.as_secs() as i32),
        period_seconds: Some(probe.period.as_secs() as i32),
        failure_threshold: Some(probe.failure_threshold as i32),
        ..Default::default()
    }
}
