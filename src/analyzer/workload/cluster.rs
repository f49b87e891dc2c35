//! Live cluster source.
//!
//! Lists the five auditable workload kinds from the Kubernetes API and converts
//! them into the simplified resource model.
//!
//! # Prerequisites
//!
//! - Valid kubeconfig (default location, an explicit file, or in-cluster config)
//! - RBAC permission to list deployments, statefulsets, daemonsets,
//!   replicationcontrollers and pods

use crate::analyzer::workload::context::{
    Capabilities, CommonMeta, ContainerSpec, DaemonSetData, DeploymentData, PodData, PodSpec,
    ReplicationControllerData, Resource, ResourceCollection, SecurityContext, StatefulSetData,
};
use crate::analyzer::workload::types::ResourceKind;
use crate::error::{AuditError, Result};
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1 as apps;
use k8s_openapi::api::core::v1 as core;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{
    Client, Config,
    api::{Api, ListParams},
};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::path::Path;

/// Kubernetes client scoped to the workload kinds the auditor reads.
pub struct ClusterClient {
    client: Client,
}

impl ClusterClient {
    /// Connect to a cluster.
    ///
    /// With neither a kubeconfig path nor a context, configuration is inferred
    /// (in-cluster, then `KUBECONFIG`/`~/.kube/config`).
    pub async fn connect(kubeconfig: Option<&Path>, context: Option<&str>) -> Result<Self> {
        let config = match (kubeconfig, context) {
            (None, None) => Config::infer().await?,
            (path, context) => {
                let kubeconfig = match path {
                    Some(path) => Kubeconfig::read_from(path)?,
                    None => Kubeconfig::read()?,
                };
                Config::from_custom_kubeconfig(
                    kubeconfig,
                    &KubeConfigOptions {
                        context: context.map(str::to_string),
                        ..Default::default()
                    },
                )
                .await?
            }
        };

        log::debug!("Connecting to Kubernetes API at {}", config.cluster_url);
        let client = Client::try_from(config)?;
        Ok(Self { client })
    }

    /// List every auditable kind, in [`ResourceKind::ALL`] order.
    ///
    /// A kind whose listing fails degenerates to an empty collection; its error
    /// is returned alongside so the caller can report it.
    pub async fn fetch(
        &self,
        namespace: Option<&str>,
    ) -> (Vec<ResourceCollection>, Vec<AuditError>) {
        let (deployments, statefulsets, daemonsets, controllers, pods) = tokio::join!(
            self.list::<apps::Deployment>(namespace, ResourceKind::Deployment),
            self.list::<apps::StatefulSet>(namespace, ResourceKind::StatefulSet),
            self.list::<apps::DaemonSet>(namespace, ResourceKind::DaemonSet),
            self.list::<core::ReplicationController>(
                namespace,
                ResourceKind::ReplicationController
            ),
            self.list::<core::Pod>(namespace, ResourceKind::Pod),
        );

        let mut errors = Vec::new();
        let mut collect = |kind: ResourceKind, listed: Result<Vec<Resource>>| match listed {
            Ok(resources) => {
                log::debug!("Listed {} {}(s)", resources.len(), kind);
                ResourceCollection::typed(kind, resources)
            }
            Err(e) => {
                errors.push(e);
                ResourceCollection::new(kind)
            }
        };

        let collections = vec![
            collect(
                ResourceKind::Deployment,
                deployments.map(|items| {
                    items
                        .into_iter()
                        .map(|d| Resource::from(DeploymentData::from(d)))
                        .collect()
                }),
            ),
            collect(
                ResourceKind::StatefulSet,
                statefulsets.map(|items| {
                    items
                        .into_iter()
                        .map(|s| Resource::from(StatefulSetData::from(s)))
                        .collect()
                }),
            ),
            collect(
                ResourceKind::DaemonSet,
                daemonsets.map(|items| {
                    items
                        .into_iter()
                        .map(|d| Resource::from(DaemonSetData::from(d)))
                        .collect()
                }),
            ),
            collect(
                ResourceKind::ReplicationController,
                controllers.map(|items| {
                    items
                        .into_iter()
                        .map(|rc| Resource::from(ReplicationControllerData::from(rc)))
                        .collect()
                }),
            ),
            collect(
                ResourceKind::Pod,
                pods.map(|items| {
                    items
                        .into_iter()
                        .filter(|pod| !is_owned(&pod.metadata))
                        .map(|pod| Resource::from(PodData::from(pod)))
                        .collect()
                }),
            ),
        ];

        (collections, errors)
    }

    async fn list<K>(&self, namespace: Option<&str>, kind: ResourceKind) -> Result<Vec<K>>
    where
        K: kube::Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as kube::Resource>::DynamicType: Default,
    {
        let api: Api<K> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };

        api.list(&ListParams::default())
            .await
            .map(|list| list.items)
            .map_err(|e| AuditError::Listing {
                kind: kind.to_string(),
                message: e.to_string(),
            })
    }
}

/// Pods created by a controller are audited through their owner.
fn is_owned(metadata: &ObjectMeta) -> bool {
    metadata
        .owner_references
        .as_ref()
        .is_some_and(|refs| !refs.is_empty())
}

// ============================================================================
// Conversions from the API types
// ============================================================================

fn convert_meta(metadata: ObjectMeta) -> CommonMeta {
    CommonMeta {
        name: metadata.name.unwrap_or_default(),
        namespace: metadata.namespace,
    }
}

fn convert_template(template: core::PodTemplateSpec) -> Option<PodSpec> {
    template.spec.map(convert_pod_spec)
}

/// The API server mirrors `serviceAccountName` into the deprecated
/// `serviceAccount` field; only a value that differs was set by the author.
fn convert_pod_spec(spec: core::PodSpec) -> PodSpec {
    let service_account = spec
        .service_account
        .filter(|account| spec.service_account_name.as_ref() != Some(account));

    PodSpec {
        containers: spec.containers.into_iter().map(convert_container).collect(),
        service_account,
        service_account_name: spec.service_account_name,
        automount_service_account_token: spec.automount_service_account_token,
    }
}

fn convert_container(container: core::Container) -> ContainerSpec {
    ContainerSpec {
        name: container.name,
        image: container.image,
        security_context: container.security_context.map(|sc| SecurityContext {
            privileged: sc.privileged,
            run_as_non_root: sc.run_as_non_root,
            read_only_root_filesystem: sc.read_only_root_filesystem,
            capabilities: sc.capabilities.map(|caps| Capabilities {
                add: caps.add,
                drop: caps.drop,
            }),
        }),
    }
}

impl From<apps::Deployment> for DeploymentData {
    fn from(deployment: apps::Deployment) -> Self {
        Self {
            metadata: convert_meta(deployment.metadata),
            pod_spec: deployment
                .spec
                .and_then(|spec| convert_template(spec.template)),
        }
    }
}

impl From<apps::StatefulSet> for StatefulSetData {
    fn from(statefulset: apps::StatefulSet) -> Self {
        Self {
            metadata: convert_meta(statefulset.metadata),
            pod_spec: statefulset
                .spec
                .and_then(|spec| convert_template(spec.template)),
        }
    }
}

impl From<apps::DaemonSet> for DaemonSetData {
    fn from(daemonset: apps::DaemonSet) -> Self {
        Self {
            metadata: convert_meta(daemonset.metadata),
            pod_spec: daemonset
                .spec
                .and_then(|spec| convert_template(spec.template)),
        }
    }
}

impl From<core::ReplicationController> for ReplicationControllerData {
    fn from(controller: core::ReplicationController) -> Self {
        Self {
            metadata: convert_meta(controller.metadata),
            pod_spec: controller
                .spec
                .and_then(|spec| spec.template)
                .and_then(convert_template),
        }
    }
}

impl From<core::Pod> for PodData {
    fn from(pod: core::Pod) -> Self {
        Self {
            metadata: convert_meta(pod.metadata),
            spec: pod.spec.map(convert_pod_spec),
        }
    }
}
