//! Kubernetes workload wrappers for auditing.
//!
//! These are simplified representations carrying only the fields the rule
//! families read. Both the manifest parser and the cluster source produce them.

use crate::analyzer::workload::types::ResourceKind;

/// A capability shared by every workload kind: identity plus an optional pod spec.
pub trait Workload {
    fn kind(&self) -> ResourceKind;

    fn metadata(&self) -> &CommonMeta;

    /// The pod spec from the workload's template, if the template is present.
    fn pod_spec(&self) -> Option<&PodSpec>;

    fn name(&self) -> &str {
        &self.metadata().name
    }

    fn namespace(&self) -> Option<&str> {
        self.metadata().namespace.as_deref()
    }
}

/// Enum representing all auditable workload objects.
#[derive(Debug, Clone)]
pub enum Resource {
    Deployment(Box<DeploymentData>),
    StatefulSet(Box<StatefulSetData>),
    DaemonSet(Box<DaemonSetData>),
    ReplicationController(Box<ReplicationControllerData>),
    Pod(Box<PodData>),
}

impl Resource {
    fn as_workload(&self) -> &dyn Workload {
        match self {
            Self::Deployment(d) => d.as_ref(),
            Self::StatefulSet(d) => d.as_ref(),
            Self::DaemonSet(d) => d.as_ref(),
            Self::ReplicationController(d) => d.as_ref(),
            Self::Pod(d) => d.as_ref(),
        }
    }
}

impl Workload for Resource {
    fn kind(&self) -> ResourceKind {
        self.as_workload().kind()
    }

    fn metadata(&self) -> &CommonMeta {
        self.as_workload().metadata()
    }

    fn pod_spec(&self) -> Option<&PodSpec> {
        self.as_workload().pod_spec()
    }
}

impl From<DeploymentData> for Resource {
    fn from(data: DeploymentData) -> Self {
        Self::Deployment(Box::new(data))
    }
}

impl From<StatefulSetData> for Resource {
    fn from(data: StatefulSetData) -> Self {
        Self::StatefulSet(Box::new(data))
    }
}

impl From<DaemonSetData> for Resource {
    fn from(data: DaemonSetData) -> Self {
        Self::DaemonSet(Box::new(data))
    }
}

impl From<ReplicationControllerData> for Resource {
    fn from(data: ReplicationControllerData) -> Self {
        Self::ReplicationController(Box::new(data))
    }
}

impl From<PodData> for Resource {
    fn from(data: PodData) -> Self {
        Self::Pod(Box::new(data))
    }
}

/// Common metadata fields.
#[derive(Debug, Clone, Default)]
pub struct CommonMeta {
    pub name: String,
    pub namespace: Option<String>,
}

impl CommonMeta {
    pub fn new(name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.map(str::to_string),
        }
    }
}

/// Simplified container spec.
#[derive(Debug, Clone, Default)]
pub struct ContainerSpec {
    pub name: String,
    pub image: Option<String>,
    pub security_context: Option<SecurityContext>,
}

/// Security context for a container.
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    pub privileged: Option<bool>,
    pub run_as_non_root: Option<bool>,
    pub read_only_root_filesystem: Option<bool>,
    pub capabilities: Option<Capabilities>,
}

/// Linux capabilities. An absent list is distinct from an empty one.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    pub add: Option<Vec<String>>,
    pub drop: Option<Vec<String>>,
}

/// Pod spec (simplified).
#[derive(Debug, Clone, Default)]
pub struct PodSpec {
    /// Regular containers only; init containers are not audited.
    pub containers: Vec<ContainerSpec>,
    /// Deprecated alias of `service_account_name`.
    pub service_account: Option<String>,
    pub service_account_name: Option<String>,
    pub automount_service_account_token: Option<bool>,
}

// ============================================================================
// Object data types
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct DeploymentData {
    pub metadata: CommonMeta,
    pub pod_spec: Option<PodSpec>,
}

#[derive(Debug, Clone, Default)]
pub struct StatefulSetData {
    pub metadata: CommonMeta,
    pub pod_spec: Option<PodSpec>,
}

#[derive(Debug, Clone, Default)]
pub struct DaemonSetData {
    pub metadata: CommonMeta,
    pub pod_spec: Option<PodSpec>,
}

#[derive(Debug, Clone, Default)]
pub struct ReplicationControllerData {
    pub metadata: CommonMeta,
    pub pod_spec: Option<PodSpec>,
}

#[derive(Debug, Clone, Default)]
pub struct PodData {
    pub metadata: CommonMeta,
    pub spec: Option<PodSpec>,
}

impl Workload for DeploymentData {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Deployment
    }

    fn metadata(&self) -> &CommonMeta {
        &self.metadata
    }

    fn pod_spec(&self) -> Option<&PodSpec> {
        self.pod_spec.as_ref()
    }
}

impl Workload for StatefulSetData {
    fn kind(&self) -> ResourceKind {
        ResourceKind::StatefulSet
    }

    fn metadata(&self) -> &CommonMeta {
        &self.metadata
    }

    fn pod_spec(&self) -> Option<&PodSpec> {
        self.pod_spec.as_ref()
    }
}

impl Workload for DaemonSetData {
    fn kind(&self) -> ResourceKind {
        ResourceKind::DaemonSet
    }

    fn metadata(&self) -> &CommonMeta {
        &self.metadata
    }

    fn pod_spec(&self) -> Option<&PodSpec> {
        self.pod_spec.as_ref()
    }
}

impl Workload for ReplicationControllerData {
    fn kind(&self) -> ResourceKind {
        ResourceKind::ReplicationController
    }

    fn metadata(&self) -> &CommonMeta {
        &self.metadata
    }

    fn pod_spec(&self) -> Option<&PodSpec> {
        self.pod_spec.as_ref()
    }
}

impl Workload for PodData {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Pod
    }

    fn metadata(&self) -> &CommonMeta {
        &self.metadata
    }

    fn pod_spec(&self) -> Option<&PodSpec> {
        self.spec.as_ref()
    }
}
