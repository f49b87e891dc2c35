//! # kubeaudit
//!
//! Audits Kubernetes workloads for security hardening. Every container of
//! every Deployment, StatefulSet, DaemonSet, ReplicationController and
//! standalone Pod is checked against a catalogue of rules, either from a live
//! cluster or from manifest files.
//!
//! ## Features
//!
//! - **Security contexts**: capabilities, runAsNonRoot, readOnlyRootFilesystem, privileged
//! - **Service accounts**: deprecated fields and automounted default tokens
//! - **Images**: containers running an image must use the expected tag
//! - **Concurrent**: every (rule, resource kind) pair is audited on its own task
//!
//! ## Example
//!
//! ```rust,no_run
//! use kubeaudit::analyzer::workload::{AuditConfig, Auditor, ResourceCollection, parser};
//! use kubeaudit::analyzer::workload::formatter::{OutputFormat, reporter_for};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn audit() -> kubeaudit::Result<()> {
//! let resources = parser::load_path(Path::new("./k8s"))?;
//! let collections: Vec<_> = ResourceCollection::by_kind(resources)
//!     .into_iter()
//!     .map(Arc::new)
//!     .collect();
//!
//! let auditor = Auditor::from_config(&AuditConfig::default(), reporter_for(OutputFormat::Log))?;
//! let report = auditor.run(&collections).await;
//! println!("{} findings", report.total_findings());
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cli;
pub mod error;
pub mod handlers;

pub use error::{AuditError, Result};
use cli::{Cli, Commands};
use handlers::AuditOptions;

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn run_command(cli: Cli) -> Result<()> {
    let Cli {
        command,
        config,
        manifest,
        kubeconfig,
        context,
        namespace,
        all_containers,
        json,
        ..
    } = cli;

    let image = match &command {
        Commands::Version => {
            handlers::handle_version();
            return Ok(());
        }
        Commands::Image { image } | Commands::All { image } => image.clone(),
        Commands::Sc { .. } | Commands::Sat => None,
    };

    let options = AuditOptions {
        manifest,
        kubeconfig,
        context,
        namespace,
        config,
        image,
        all_containers,
        json,
    };

    handlers::handle_audit(command.families(), options)
        .await
        .map(|_| ())
}
