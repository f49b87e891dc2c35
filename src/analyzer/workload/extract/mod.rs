//! Extractors for workload data.
//!
//! Helper functions that normalize a resource into what the rule families
//! consume: its pod spec, its containers and a finding template.

pub mod container;
pub mod pod_spec;

pub use container::*;
pub use pod_spec::*;
