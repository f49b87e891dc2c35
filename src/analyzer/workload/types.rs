//! Core types for the workload auditor.
//!
//! - `Severity` - presentation level attached to every error code
//! - `ErrorCode` - the single taxonomy shared by all rule families
//! - `ResourceKind` - the five workload kinds that own containers
//! - `RuleFamily` - the named checks a pass can run
//! - `Finding` - one rule verdict for one container of one resource

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Severity levels for findings.
///
/// Ordered from most severe to least severe:
/// `Error > Warning > Info`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The container is configured insecurely.
    Error,
    /// The container is missing hardening that should be present.
    #[default]
    Warning,
    /// No violation.
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Error => 2,
            Self::Warning => 1,
            Self::Info => 0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Every outcome a rule family can produce.
///
/// Numeric codes keep the historical kubeaudit numbering so that downstream
/// consumers of the JSON output see stable values; codes added later are
/// appended after the last historical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    /// Informational pass.
    #[default]
    Info,
    SecurityContextMissing,
    CapabilitiesMissing,
    CapabilitiesAddedOrNotDropped,
    ImageTagMissing,
    ImageTagIncorrect,
    DeprecatedServiceAccount,
    AutomountServiceAccountTokenUnset,
    AutomountServiceAccountTokenTrue,
    PrivilegedTrue,
    PrivilegedUnset,
    RunAsNonRootFalse,
    RunAsNonRootUnset,
    ReadOnlyRootFilesystemFalse,
    ReadOnlyRootFilesystemUnset,
}

impl ErrorCode {
    /// Stable numeric value.
    pub fn code(&self) -> u16 {
        match self {
            Self::Info => 0,
            Self::SecurityContextMissing => 1,
            Self::CapabilitiesMissing => 2,
            Self::ImageTagMissing => 5,
            Self::ImageTagIncorrect => 6,
            Self::DeprecatedServiceAccount => 7,
            Self::AutomountServiceAccountTokenUnset => 8,
            Self::PrivilegedTrue => 9,
            Self::RunAsNonRootFalse => 10,
            Self::ReadOnlyRootFilesystemFalse => 11,
            Self::AutomountServiceAccountTokenTrue => 12,
            Self::CapabilitiesAddedOrNotDropped => 13,
            Self::RunAsNonRootUnset => 14,
            Self::ReadOnlyRootFilesystemUnset => 15,
            Self::PrivilegedUnset => 16,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Info => Severity::Info,
            Self::CapabilitiesMissing
            | Self::CapabilitiesAddedOrNotDropped
            | Self::DeprecatedServiceAccount
            | Self::AutomountServiceAccountTokenUnset
            | Self::PrivilegedUnset => Severity::Warning,
            Self::SecurityContextMissing
            | Self::ImageTagMissing
            | Self::ImageTagIncorrect
            | Self::AutomountServiceAccountTokenTrue
            | Self::PrivilegedTrue
            | Self::RunAsNonRootFalse
            | Self::RunAsNonRootUnset
            | Self::ReadOnlyRootFilesystemFalse
            | Self::ReadOnlyRootFilesystemUnset => Severity::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::SecurityContextMissing => "security-context-missing",
            Self::CapabilitiesMissing => "capabilities-missing",
            Self::CapabilitiesAddedOrNotDropped => "capabilities-added-or-not-dropped",
            Self::ImageTagMissing => "image-tag-missing",
            Self::ImageTagIncorrect => "image-tag-incorrect",
            Self::DeprecatedServiceAccount => "deprecated-service-account",
            Self::AutomountServiceAccountTokenUnset => "automount-service-account-token-unset",
            Self::AutomountServiceAccountTokenTrue => "automount-service-account-token-true",
            Self::PrivilegedTrue => "privileged-true",
            Self::PrivilegedUnset => "privileged-unset",
            Self::RunAsNonRootFalse => "run-as-non-root-false",
            Self::RunAsNonRootUnset => "run-as-non-root-unset",
            Self::ReadOnlyRootFilesystemFalse => "read-only-root-filesystem-false",
            Self::ReadOnlyRootFilesystemUnset => "read-only-root-filesystem-unset",
        }
    }

    /// Human-readable message used by the reporters.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Info => "No violation",
            Self::SecurityContextMissing => "SecurityContext not set, please set it!",
            Self::CapabilitiesMissing => "Capabilities field not defined!",
            Self::CapabilitiesAddedOrNotDropped => "Capabilities added or not dropped",
            Self::ImageTagMissing => "Image tag was missing",
            Self::ImageTagIncorrect => "Image tag was incorrect",
            Self::DeprecatedServiceAccount => {
                "serviceAccount is a deprecated alias for serviceAccountName"
            }
            Self::AutomountServiceAccountTokenUnset => {
                "automountServiceAccountToken is not set and the default service account is used"
            }
            Self::AutomountServiceAccountTokenTrue => {
                "automountServiceAccountToken is true and the default service account is used"
            }
            Self::PrivilegedTrue => "Privileged is set to true",
            Self::PrivilegedUnset => "Privileged is not set (defaults to false)",
            Self::RunAsNonRootFalse => "RunAsNonRoot is set to false",
            Self::RunAsNonRootUnset => "RunAsNonRoot is not set",
            Self::ReadOnlyRootFilesystemFalse => "ReadOnlyRootFilesystem is set to false",
            Self::ReadOnlyRootFilesystemUnset => "ReadOnlyRootFilesystem is not set",
        }
    }

    pub fn is_violation(&self) -> bool {
        *self != Self::Info
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Workload kinds that carry a pod template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Deployment,
    StatefulSet,
    DaemonSet,
    ReplicationController,
    Pod,
}

impl ResourceKind {
    /// All kinds, in the order an audit pass launches them.
    pub const ALL: [ResourceKind; 5] = [
        Self::Deployment,
        Self::StatefulSet,
        Self::DaemonSet,
        Self::ReplicationController,
        Self::Pod,
    ];

    /// Get the string representation matching Kubernetes kind names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployment => "Deployment",
            Self::StatefulSet => "StatefulSet",
            Self::DaemonSet => "DaemonSet",
            Self::ReplicationController => "ReplicationController",
            Self::Pod => "Pod",
        }
    }

    /// Parse from a Kubernetes kind string.
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "Deployment" => Some(Self::Deployment),
            "StatefulSet" => Some(Self::StatefulSet),
            "DaemonSet" => Some(Self::DaemonSet),
            "ReplicationController" => Some(Self::ReplicationController),
            "Pod" => Some(Self::Pod),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The named checks an audit pass can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleFamily {
    Capabilities,
    RunAsNonRoot,
    ReadOnlyRootFs,
    Privileged,
    ServiceAccount,
    Image,
}

impl RuleFamily {
    pub const ALL: [RuleFamily; 6] = [
        Self::Capabilities,
        Self::RunAsNonRoot,
        Self::ReadOnlyRootFs,
        Self::Privileged,
        Self::ServiceAccount,
        Self::Image,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Capabilities => "capabilities",
            Self::RunAsNonRoot => "run-as-non-root",
            Self::ReadOnlyRootFs => "read-only-root-fs",
            Self::Privileged => "privileged",
            Self::ServiceAccount => "service-account",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for RuleFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rule-specific payload carried by a finding.
///
/// Each field is populated only by the rule family it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingDetails {
    /// Capabilities added to the container (capabilities rule).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caps_added: Option<Vec<String>>,
    /// Whether the container drops any capability (capabilities rule).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caps_dropped: Option<bool>,
    /// Observed image name (image rule).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    /// Observed image tag (image rule).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_tag: Option<String>,
}

/// A non-informational outcome produced by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub code: ErrorCode,
    pub details: FindingDetails,
}

impl Violation {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            details: FindingDetails::default(),
        }
    }

    pub fn with_details(code: ErrorCode, details: FindingDetails) -> Self {
        Self { code, details }
    }
}

/// What a rule decided for one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Violation(Violation),
}

impl Verdict {
    pub fn violation(code: ErrorCode) -> Self {
        Self::Violation(Violation::new(code))
    }

    /// The code carried by this verdict (`Info` for a pass).
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Pass => ErrorCode::Info,
            Self::Violation(v) => v.code,
        }
    }

    pub fn into_violation(self) -> Option<Violation> {
        match self {
            Self::Pass => None,
            Self::Violation(v) => Some(v),
        }
    }
}

/// One rule verdict for one container of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Kind of the owning resource.
    pub kube_type: ResourceKind,
    /// Namespace of the owning resource (if set).
    pub namespace: Option<String>,
    /// Name of the owning resource.
    pub name: String,
    /// Name of the container the verdict applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    pub code: ErrorCode,
    #[serde(flatten)]
    pub details: FindingDetails,
}

impl Finding {
    /// Create an informational template stamped with a resource identity.
    pub fn template(
        kube_type: ResourceKind,
        namespace: Option<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kube_type,
            namespace,
            name: name.into(),
            container: None,
            code: ErrorCode::Info,
            details: FindingDetails::default(),
        }
    }

    /// Finalize a template with the violation found in `container`.
    pub fn with_violation(mut self, container: impl Into<String>, violation: Violation) -> Self {
        self.container = Some(container.into());
        self.code = violation.code;
        self.details = violation.details;
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// `namespace/name`, or just the name for unnamespaced manifests.
    pub fn object_identifier(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}/{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert_eq!(
            [Severity::Info, Severity::Error, Severity::Warning]
                .into_iter()
                .max(),
            Some(Severity::Error)
        );
    }

    #[test]
    fn test_error_code_numbering_is_unique() {
        let codes = [
            ErrorCode::Info,
            ErrorCode::SecurityContextMissing,
            ErrorCode::CapabilitiesMissing,
            ErrorCode::CapabilitiesAddedOrNotDropped,
            ErrorCode::ImageTagMissing,
            ErrorCode::ImageTagIncorrect,
            ErrorCode::DeprecatedServiceAccount,
            ErrorCode::AutomountServiceAccountTokenUnset,
            ErrorCode::AutomountServiceAccountTokenTrue,
            ErrorCode::PrivilegedTrue,
            ErrorCode::PrivilegedUnset,
            ErrorCode::RunAsNonRootFalse,
            ErrorCode::RunAsNonRootUnset,
            ErrorCode::ReadOnlyRootFilesystemFalse,
            ErrorCode::ReadOnlyRootFilesystemUnset,
        ];
        let mut numbers: Vec<u16> = codes.iter().map(|c| c.code()).collect();
        numbers.sort_unstable();
        numbers.dedup();
        assert_eq!(numbers.len(), codes.len());
        assert_eq!(ErrorCode::Info.code(), 0);
        assert!(!ErrorCode::Info.is_violation());
        assert!(codes[1..].iter().all(|c| c.is_violation()));
    }

    #[test]
    fn test_error_code_severity() {
        assert_eq!(ErrorCode::Info.severity(), Severity::Info);
        assert_eq!(ErrorCode::CapabilitiesMissing.severity(), Severity::Warning);
        assert_eq!(
            ErrorCode::CapabilitiesAddedOrNotDropped.severity(),
            Severity::Warning
        );
        assert_eq!(ErrorCode::SecurityContextMissing.severity(), Severity::Error);
        assert_eq!(ErrorCode::RunAsNonRootUnset.severity(), Severity::Error);
    }

    #[test]
    fn test_rule_family_names_match_config_keys() {
        for family in RuleFamily::ALL {
            let parsed: RuleFamily = serde_yaml::from_str(family.as_str()).unwrap();
            assert_eq!(parsed, family);
        }
    }

    #[test]
    fn test_finding_keeps_template_identity() {
        let template = Finding::template(ResourceKind::StatefulSet, Some("prod".into()), "db");
        assert_eq!(template.code, ErrorCode::Info);

        let finding = template.with_violation(
            "postgres",
            Violation::new(ErrorCode::RunAsNonRootUnset),
        );
        assert_eq!(finding.kube_type, ResourceKind::StatefulSet);
        assert_eq!(finding.object_identifier(), "prod/db");
        assert_eq!(finding.container.as_deref(), Some("postgres"));
        assert_eq!(finding.severity(), Severity::Error);
    }

    #[test]
    fn test_finding_serializes_only_populated_details() {
        let finding = Finding::template(ResourceKind::Pod, None, "web").with_violation(
            "nginx",
            Violation::with_details(
                ErrorCode::ImageTagIncorrect,
                FindingDetails {
                    image_name: Some("nginx".into()),
                    image_tag: Some("1.19".into()),
                    ..Default::default()
                },
            ),
        );
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["code"], "image-tag-incorrect");
        assert_eq!(json["image_tag"], "1.19");
        assert!(json.get("caps_added").is_none());
    }
}
