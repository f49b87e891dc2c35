//! Log reporter.
//!
//! Emits one `log` record per finding at the level matching its severity:
//! `<message> <namespace>/<name> type=<kind> container=<name> [payload fields]`.

use crate::analyzer::workload::formatter::Reporter;
use crate::analyzer::workload::types::{Finding, ResourceKind, RuleFamily, Severity};
use crate::error::AuditError;
use log::Level;

pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, family: RuleFamily, kind: Option<ResourceKind>, findings: &[Finding]) {
        if findings.is_empty() {
            log::debug!(
                "[{}] no findings for {}",
                family,
                kind.map(|k| k.as_str()).unwrap_or("manifest")
            );
            return;
        }

        for finding in findings {
            let (level, line) = render(family, finding);
            log::log!(level, "{}", line);
        }
    }

    fn report_error(&self, error: &AuditError) {
        log::error!("{}", error);
    }
}

/// Map a finding severity onto a log level.
pub fn level_for(severity: Severity) -> Level {
    match severity {
        Severity::Error => Level::Error,
        Severity::Warning => Level::Warn,
        Severity::Info => Level::Info,
    }
}

/// Render one finding as a log line.
pub fn render(family: RuleFamily, finding: &Finding) -> (Level, String) {
    let mut line = format!(
        "{} {} type={} rule={}",
        finding.code.message(),
        finding.object_identifier(),
        finding.kube_type,
        family
    );

    if let Some(container) = &finding.container {
        line.push_str(&format!(" container={}", container));
    }
    if let Some(added) = &finding.details.caps_added {
        line.push_str(&format!(" capsAdded={}", added.join(",")));
    }
    if let Some(dropped) = finding.details.caps_dropped {
        line.push_str(&format!(" capsDropped={}", dropped));
    }
    if let Some(name) = &finding.details.image_name {
        line.push_str(&format!(" image={}", name));
    }
    if let Some(tag) = &finding.details.image_tag {
        line.push_str(&format!(" tag={}", tag));
    }

    (level_for(finding.severity()), line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::workload::types::{ErrorCode, FindingDetails, Violation};

    #[test]
    fn test_render_security_context_missing() {
        let finding = Finding::template(ResourceKind::Deployment, Some("default".into()), "web")
            .with_violation("nginx", Violation::new(ErrorCode::SecurityContextMissing));

        let (level, line) = render(RuleFamily::RunAsNonRoot, &finding);
        assert_eq!(level, Level::Error);
        assert_eq!(
            line,
            "SecurityContext not set, please set it! default/web type=Deployment \
             rule=run-as-non-root container=nginx"
        );
    }

    #[test]
    fn test_render_capabilities_payload() {
        let finding = Finding::template(ResourceKind::Pod, None, "debug").with_violation(
            "shell",
            Violation::with_details(
                ErrorCode::CapabilitiesAddedOrNotDropped,
                FindingDetails {
                    caps_added: Some(vec!["NET_ADMIN".into(), "SYS_PTRACE".into()]),
                    caps_dropped: Some(false),
                    ..Default::default()
                },
            ),
        );

        let (level, line) = render(RuleFamily::Capabilities, &finding);
        assert_eq!(level, Level::Warn);
        assert!(line.starts_with("Capabilities added or not dropped debug type=Pod"));
        assert!(line.ends_with("capsAdded=NET_ADMIN,SYS_PTRACE capsDropped=false"));
    }

    #[test]
    fn test_level_for_severity() {
        assert_eq!(level_for(Severity::Info), Level::Info);
        assert_eq!(level_for(Severity::Warning), Level::Warn);
    }
}
