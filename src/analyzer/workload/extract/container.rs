//! Container extraction utilities.

use crate::analyzer::workload::context::{ContainerSpec, PodSpec, Workload};
use crate::analyzer::workload::extract::pod_spec::extract_pod_spec;
use crate::analyzer::workload::types::Finding;

/// The containers of one resource plus the finding template stamped with its identity.
#[derive(Debug, Clone)]
pub struct Extraction<'a> {
    pub pod_spec: Option<&'a PodSpec>,
    pub containers: Vec<&'a ContainerSpec>,
    pub template: Finding,
}

/// Normalize a resource into its ordered regular containers and a fresh template.
///
/// A resource without a pod template yields no containers.
pub fn extract<W: Workload + ?Sized>(obj: &W) -> Extraction<'_> {
    let pod_spec = extract_pod_spec(obj);
    Extraction {
        pod_spec,
        containers: pod_spec.map(extract_containers).unwrap_or_default(),
        template: Finding::template(
            obj.kind(),
            obj.namespace().map(str::to_string),
            obj.name(),
        ),
    }
}

/// Extract only regular containers (not init containers).
pub fn extract_containers(pod_spec: &PodSpec) -> Vec<&ContainerSpec> {
    pod_spec.containers.iter().collect()
}
