//! PodSpec extraction utilities.

use crate::analyzer::workload::context::{PodSpec, Workload};

/// Extract the PodSpec from a workload, if its template is present.
pub fn extract_pod_spec<W: Workload + ?Sized>(obj: &W) -> Option<&PodSpec> {
    obj.pod_spec()
}

/// Check if a workload has a PodSpec.
pub fn has_pod_spec<W: Workload + ?Sized>(obj: &W) -> bool {
    extract_pod_spec(obj).is_some()
}
