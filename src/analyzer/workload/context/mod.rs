//! Resource collections for an audit pass.
//!
//! A collection holds the resources one audit task walks. Iteration is
//! restartable: every call to [`ResourceCollection::iter`] re-reads the same
//! backing list in insertion order.

pub mod object;

pub use object::{
    Capabilities, CommonMeta, ContainerSpec, DaemonSetData, DeploymentData, PodData, PodSpec,
    ReplicationControllerData, Resource, SecurityContext, StatefulSetData, Workload,
};

use crate::analyzer::workload::types::ResourceKind;

/// A list of resources of one kind, or a mixed group from a manifest.
#[derive(Debug, Clone, Default)]
pub struct ResourceCollection {
    kind: Option<ResourceKind>,
    resources: Vec<Resource>,
}

impl ResourceCollection {
    /// Create an empty collection for one kind.
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind: Some(kind),
            resources: Vec::new(),
        }
    }

    /// Create a collection for one kind from already-typed resources.
    ///
    /// Resources of another kind are dropped with a warning.
    pub fn typed(kind: ResourceKind, resources: impl IntoIterator<Item = Resource>) -> Self {
        let mut collection = Self::new(kind);
        for resource in resources {
            collection.push(resource);
        }
        collection
    }

    /// Create a heterogeneous collection.
    pub fn mixed(resources: Vec<Resource>) -> Self {
        Self {
            kind: None,
            resources,
        }
    }

    /// Split a heterogeneous list into one collection per kind.
    ///
    /// Always returns five collections in [`ResourceKind::ALL`] order; kinds
    /// without resources get an empty collection.
    pub fn by_kind(resources: Vec<Resource>) -> Vec<Self> {
        let mut collections: Vec<Self> = ResourceKind::ALL.into_iter().map(Self::new).collect();
        for resource in resources {
            if let Some(collection) = collections.iter_mut().find(|c| c.kind == Some(resource.kind())) {
                collection.resources.push(resource);
            }
        }
        collections
    }

    /// Add a resource to the collection.
    pub fn push(&mut self, resource: Resource) {
        match self.kind {
            Some(kind) if kind != resource.kind() => {
                log::warn!(
                    "Ignoring {} {} in a {} collection",
                    resource.kind(),
                    resource.name(),
                    kind
                );
            }
            _ => self.resources.push(resource),
        }
    }

    /// The kind held by this collection, `None` for a mixed group.
    pub fn kind(&self) -> Option<ResourceKind> {
        self.kind
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl<'a> IntoIterator for &'a ResourceCollection {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.iter()
    }
}
