//! Workload security auditing.
//!
//! Walks Deployments, StatefulSets, DaemonSets, ReplicationControllers and
//! standalone Pods, and evaluates each container against a fixed catalogue of
//! hardening rules.
//!
//! # Rule families
//!
//! - `capabilities` - capabilities must be dropped and none added
//! - `run-as-non-root` - `runAsNonRoot: true`
//! - `read-only-root-fs` - `readOnlyRootFilesystem: true`
//! - `privileged` - `privileged` must not be true
//! - `service-account` - no deprecated `serviceAccount`, no automounted default token
//! - `image` - containers running a given image must use the expected tag
//!
//! # Example
//!
//! ```rust,ignore
//! use kubeaudit::analyzer::workload::{AuditConfig, Auditor, ResourceCollection, parser};
//! use kubeaudit::analyzer::workload::formatter::{reporter_for, OutputFormat};
//! use std::sync::Arc;
//!
//! let resources = parser::load_path(Path::new("./k8s"))?;
//! let collections: Vec<_> = ResourceCollection::by_kind(resources)
//!     .into_iter()
//!     .map(Arc::new)
//!     .collect();
//!
//! let auditor = Auditor::from_config(&AuditConfig::default(), reporter_for(OutputFormat::Log))?;
//! let report = auditor.run(&collections).await;
//! println!("{} findings", report.total_findings());
//! ```

pub mod audit;
pub mod cluster;
pub mod config;
pub mod context;
pub mod extract;
pub mod formatter;
pub mod parser;
pub mod rules;
pub mod types;

pub use audit::{AuditReport, Auditor, TaskReport, audit_collection};
pub use config::{AuditConfig, ViolationScope};
pub use context::{Resource, ResourceCollection, Workload};
pub use types::{ErrorCode, Finding, ResourceKind, RuleFamily, Severity};
