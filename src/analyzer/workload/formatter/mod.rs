//! Reporters for audit findings.
//!
//! A reporter is invoked once per audit task, after that task's scan, with the
//! findings it produced. Calls from different tasks may interleave.

pub mod json;
pub mod logger;

use crate::analyzer::workload::types::{Finding, ResourceKind, RuleFamily};
use crate::error::AuditError;
use std::sync::Arc;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One log record per finding.
    #[default]
    Log,
    /// One JSON object per finding per line on stdout.
    Json,
}

pub trait Reporter: Send + Sync {
    /// Render the findings of one (rule family, resource kind) task.
    fn report(&self, family: RuleFamily, kind: Option<ResourceKind>, findings: &[Finding]);

    /// Render an infrastructure error that disabled part of the pass.
    fn report_error(&self, error: &AuditError);
}

pub fn reporter_for(format: OutputFormat) -> Arc<dyn Reporter> {
    match format {
        OutputFormat::Log => Arc::new(logger::LogReporter),
        OutputFormat::Json => Arc::new(json::JsonReporter::stdout()),
    }
}
