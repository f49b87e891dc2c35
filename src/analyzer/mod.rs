//! # Analyzer Module
//!
//! Security analysis of Kubernetes workloads, from manifests or a live cluster.

pub mod workload;

pub use workload::{AuditConfig, AuditReport, Auditor, Finding, ResourceKind, RuleFamily};
