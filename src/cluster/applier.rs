// ABOUTME: kube-based control-plane client implementation.
// ABOUTME: Namespace create-or-ignore, create-or-update apply, status reads.

use super::error::ApplyError;
use super::observation::RolloutObservation;
use super::sealed::Sealed;
use super::traits::ClusterOps;
use crate::config::ClusterConfig;
use crate::manifest::{ClusterResourceSet, Workload};
use crate::types::{ResourceKey, ResourceKind};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Namespace, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_api_error(e: kube::Error, key: &ResourceKey) -> ApplyError {
    match e {
        kube::Error::Api(ae) if ae.code == 403 => ApplyError::Forbidden {
            key: key.clone(),
            message: ae.message,
        },
        kube::Error::Api(ae) if ae.code == 404 => ApplyError::NotFound(key.clone()),
        kube::Error::Api(ae) => ApplyError::Rejected {
            key: key.clone(),
            message: ae.message,
        },
        other => ApplyError::Connection(other.to_string()),
    }
}

fn map_status_error(e: kube::Error, key: &ResourceKey) -> ApplyError {
    match e {
        kube::Error::Api(ae) if ae.code == 404 => ApplyError::NotFound(key.clone()),
        kube::Error::Api(ae) => ApplyError::Status {
            key: key.clone(),
            message: ae.message,
        },
        other => ApplyError::Connection(other.to_string()),
    }
}

// =============================================================================
// KubeApplier
// =============================================================================

/// Control-plane client for one cluster, built from an explicit
/// configuration object so tests and multi-cluster callers can hold several
/// isolated instances.
pub struct KubeApplier {
    client: Client,
    patch_params: PatchParams,
}

impl KubeApplier {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            patch_params: PatchParams::default(),
        }
    }

    /// Connect using the spec's cluster section: an explicit kubeconfig path
    /// and context if given, otherwise the standard loader chain.
    pub async fn connect(cluster: &ClusterConfig) -> Result<Self, ApplyError> {
        let options = KubeConfigOptions {
            context: cluster.context.clone(),
            ..Default::default()
        };

        let config = match &cluster.kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .map_err(|e| ApplyError::Connection(e.to_string()))?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(|e| ApplyError::Connection(e.to_string()))?
            }
            None if cluster.context.is_some() => Config::from_kubeconfig(&options)
                .await
                .map_err(|e| ApplyError::Connection(e.to_string()))?,
            None => Config::infer()
                .await
                .map_err(|e| ApplyError::Connection(e.to_string()))?,
        };

        let client =
            Client::try_from(config).map_err(|e| ApplyError::Connection(e.to_string()))?;

        Ok(Self::new(client))
    }

    async fn apply_deployment(
        &self,
        deployment: &Deployment,
        key: &ResourceKey,
    ) -> Result<(), ApplyError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), &key.namespace);

        match api
            .get_opt(&key.name)
            .await
            .map_err(|e| map_api_error(e, key))?
        {
            None => {
                api.create(&PostParams::default(), deployment)
                    .await
                    .map_err(|e| map_api_error(e, key))?;
                tracing::info!(%key, "workload created");
            }
            Some(_) => {
                // Merge-patch only the mutable subset: replicas and the pod
                // template. The selector is immutable and never attempted.
                let patch = serde_json::json!({
                    "spec": {
                        "replicas": deployment.spec.as_ref().and_then(|s| s.replicas),
                        "template": deployment.spec.as_ref().map(|s| &s.template),
                    }
                });
                api.patch(&key.name, &self.patch_params, &Patch::Merge(&patch))
                    .await
                    .map_err(|e| map_api_error(e, key))?;
                tracing::info!(%key, "workload updated");
            }
        }

        Ok(())
    }

    async fn apply_job(&self, job: &Job, key: &ResourceKey) -> Result<(), ApplyError> {
        let api: Api<Job> = Api::namespaced(self.client.clone(), &key.namespace);

        // A job's pod template is immutable; an existing job of the same
        // name is the same run and is left untouched.
        match api
            .get_opt(&key.name)
            .await
            .map_err(|e| map_api_error(e, key))?
        {
            None => {
                api.create(&PostParams::default(), job)
                    .await
                    .map_err(|e| map_api_error(e, key))?;
                tracing::info!(%key, "job created");
            }
            Some(_) => {
                tracing::info!(%key, "job already exists, leaving in place");
            }
        }

        Ok(())
    }

    async fn apply_service(&self, service: &Service, key: &ResourceKey) -> Result<(), ApplyError> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), &key.namespace);

        match api
            .get_opt(&key.name)
            .await
            .map_err(|e| map_api_error(e, key))?
        {
            None => {
                api.create(&PostParams::default(), service)
                    .await
                    .map_err(|e| map_api_error(e, key))?;
                tracing::info!(%key, "service created");
            }
            Some(_) => {
                // clusterIP and friends are immutable; patch only ports and
                // selector.
                let patch = serde_json::json!({
                    "spec": {
                        "ports": service.spec.as_ref().and_then(|s| s.ports.as_ref()),
                        "selector": service.spec.as_ref().and_then(|s| s.selector.as_ref()),
                    }
                });
                api.patch(&key.name, &self.patch_params, &Patch::Merge(&patch))
                    .await
                    .map_err(|e| map_api_error(e, key))?;
                tracing::info!(%key, "service updated");
            }
        }

        Ok(())
    }

    async fn deployment_status(&self, key: &ResourceKey) -> Result<RolloutObservation, ApplyError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), &key.namespace);
        let deployment = api
            .get(&key.name)
            .await
            .map_err(|e| map_status_error(e, key))?;

        let desired = deployment
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .unwrap_or(1);
        let status = deployment.status.unwrap_or_default();

        Ok(RolloutObservation::new(
            desired,
            status.ready_replicas.unwrap_or(0),
            status.available_replicas.unwrap_or(0),
        ))
    }

    async fn job_status(&self, key: &ResourceKey) -> Result<RolloutObservation, ApplyError> {
        let api: Api<Job> = Api::namespaced(self.client.clone(), &key.namespace);
        let job = api
            .get(&key.name)
            .await
            .map_err(|e| map_status_error(e, key))?;

        let status = job.status.unwrap_or_default();
        let succeeded = status.succeeded.unwrap_or(0);

        // A single-run job is "ready" once one completion succeeded.
        Ok(RolloutObservation::new(
            1,
            succeeded,
            status.active.unwrap_or(0) + succeeded,
        ))
    }
}

impl Sealed for KubeApplier {}

#[async_trait]
impl ClusterOps for KubeApplier {
    async fn ensure_namespace(&self, name: &str) -> Result<(), ApplyError> {
        let key = ResourceKey::new(ResourceKind::Namespace, "", name);
        let api: Api<Namespace> = Api::all(self.client.clone());

        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        match api.create(&PostParams::default(), &namespace).await {
            Ok(_) => {
                tracing::info!(namespace = name, "namespace created");
                Ok(())
            }
            // Already exists: create-or-ignore-conflict semantics.
            Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(()),
            Err(e) => Err(map_api_error(e, &key)),
        }
    }

    async fn apply(&self, resources: &ClusterResourceSet) -> Result<Vec<ResourceKey>, ApplyError> {
        let workload_key = resources.workload_key();
        match &resources.workload {
            Workload::Deployment(deployment) => {
                self.apply_deployment(deployment, &workload_key).await?;
            }
            Workload::Job(job) => {
                self.apply_job(job, &workload_key).await?;
            }
        }

        let service_key = resources.service_key();
        self.apply_service(&resources.service, &service_key).await?;

        Ok(vec![workload_key, service_key])
    }

    async fn rollout_status(&self, key: &ResourceKey) -> Result<RolloutObservation, ApplyError> {
        match key.kind {
            ResourceKind::Deployment => self.deployment_status(key).await,
            ResourceKind::Job => self.job_status(key).await,
            _ => Err(ApplyError::Status {
                key: key.clone(),
                message: "resource kind has no rollout status".to_string(),
            }),
        }
    }

    async fn service_ingress(&self, key: &ResourceKey) -> Result<Option<String>, ApplyError> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), &key.namespace);
        let service = api
            .get(&key.name)
            .await
            .map_err(|e| map_status_error(e, key))?;

        let address = service
            .status
            .and_then(|s| s.load_balancer)
            .and_then(|lb| lb.ingress)
            .and_then(|ingress| {
                ingress
                    .into_iter()
                    .find_map(|entry| entry.ip.or(entry.hostname))
            });

        Ok(address)
    }
}
