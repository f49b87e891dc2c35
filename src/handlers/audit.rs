use crate::analyzer::workload::cluster::ClusterClient;
use crate::analyzer::workload::config::{AuditConfig, ViolationScope};
use crate::analyzer::workload::context::ResourceCollection;
use crate::analyzer::workload::formatter::{OutputFormat, Reporter, reporter_for};
use crate::analyzer::workload::parser;
use crate::analyzer::workload::types::RuleFamily;
use crate::analyzer::workload::{AuditReport, Auditor};
use crate::error::{AuditError, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// Options shared by every audit command.
#[derive(Debug, Clone, Default)]
pub struct AuditOptions {
    /// Manifest file or directory. `None` audits the live cluster.
    pub manifest: Option<PathBuf>,
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub namespace: Option<String>,
    pub config: Option<PathBuf>,
    pub image: Option<String>,
    pub all_containers: bool,
    pub json: bool,
}

/// Merge the configuration file with command-line overrides.
pub fn build_config(
    families: Option<Vec<RuleFamily>>,
    options: &AuditOptions,
) -> Result<AuditConfig> {
    let mut config = match &options.config {
        Some(path) => AuditConfig::load_from_file(path)?,
        None => AuditConfig::load_from_default()?.unwrap_or_default(),
    };

    if let Some(families) = families {
        config = config.with_rules(families);
    }
    if let Some(image) = &options.image {
        config = config.with_image(image.clone());
    }
    if let Some(namespace) = &options.namespace {
        config = config.with_namespace(namespace.clone());
    }
    if options.all_containers {
        config = config.with_scope(ViolationScope::AllContainers);
    }

    Ok(config)
}

/// Run an audit pass for the selected rule families.
///
/// `families` of `None` runs what the configuration resolves to.
pub async fn handle_audit(
    families: Option<Vec<RuleFamily>>,
    options: AuditOptions,
) -> Result<AuditReport> {
    let config = build_config(families, &options)?;
    let format = if options.json {
        OutputFormat::Json
    } else {
        OutputFormat::Log
    };
    let reporter = reporter_for(format);

    let auditor = Auditor::from_config(&config, Arc::clone(&reporter))?;
    log::debug!("Running rule families: {:?}", auditor.families());

    let (collections, source_errors) =
        load_collections(&options, &config, reporter.as_ref()).await?;
    let collections: Vec<Arc<ResourceCollection>> =
        collections.into_iter().map(Arc::new).collect();

    let mut report = auditor.run(&collections).await;
    report.errors.extend(source_errors);

    log::debug!(
        "Audit finished: {} finding(s), {} error(s)",
        report.total_findings(),
        report.errors.len()
    );
    Ok(report)
}

async fn load_collections(
    options: &AuditOptions,
    config: &AuditConfig,
    reporter: &dyn Reporter,
) -> Result<(Vec<ResourceCollection>, Vec<String>)> {
    if let Some(path) = &options.manifest {
        let resources = parser::load_path(path)?;
        log::debug!("Loaded {} workload(s) from {}", resources.len(), path.display());
        return Ok((ResourceCollection::by_kind(resources), Vec::new()));
    }

    // Install rustls crypto provider (required for TLS connections to K8s API)
    let _ = rustls::crypto::ring::default_provider().install_default();

    let client =
        ClusterClient::connect(options.kubeconfig.as_deref(), options.context.as_deref()).await?;
    let (collections, errors) = client.fetch(config.namespace.as_deref()).await;

    let errors = errors
        .iter()
        .map(|e: &AuditError| {
            reporter.report_error(e);
            e.to_string()
        })
        .collect();
    Ok((collections, errors))
}
