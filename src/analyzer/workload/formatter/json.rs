//! JSON lines reporter.

use crate::analyzer::workload::formatter::Reporter;
use crate::analyzer::workload::types::{Finding, ResourceKind, RuleFamily};
use crate::error::AuditError;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Mutex;

/// Writes one JSON object per finding, one per line.
pub struct JsonReporter<W: Write + Send = io::Stdout> {
    out: Mutex<W>,
}

impl JsonReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_lines(&self, lines: &[String]) {
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for line in lines {
            if let Err(e) = writeln!(out, "{}", line) {
                log::error!("Failed to write JSON finding: {}", e);
                return;
            }
        }
        let _ = out.flush();
    }
}

#[derive(Serialize)]
struct JsonFinding<'a> {
    level: &'static str,
    rule: &'static str,
    msg: &'static str,
    error_code: u16,
    #[serde(flatten)]
    finding: &'a Finding,
}

#[derive(Serialize)]
struct JsonError {
    level: &'static str,
    msg: String,
}

/// Format one finding as a single JSON line.
pub fn format_finding(family: RuleFamily, finding: &Finding) -> String {
    let record = JsonFinding {
        level: finding.severity().as_str(),
        rule: family.as_str(),
        msg: finding.code.message(),
        error_code: finding.code.code(),
        finding,
    };
    serde_json::to_string(&record).unwrap_or_else(|_| "{}".to_string())
}

impl<W: Write + Send> Reporter for JsonReporter<W> {
    fn report(&self, family: RuleFamily, _kind: Option<ResourceKind>, findings: &[Finding]) {
        let lines: Vec<String> = findings
            .iter()
            .map(|finding| format_finding(family, finding))
            .collect();
        self.write_lines(&lines);
    }

    fn report_error(&self, error: &AuditError) {
        let record = JsonError {
            level: "error",
            msg: error.to_string(),
        };
        let line = serde_json::to_string(&record).unwrap_or_else(|_| "{}".to_string());
        self.write_lines(&[line]);
    }
}
