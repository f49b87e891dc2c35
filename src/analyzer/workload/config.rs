//! Audit configuration.
//!
//! Selects the rule families a pass runs, the expected image reference, an
//! optional namespace and how many violating containers a resource may report.
//! Loadable from `.kubeaudit.yaml`; command-line flags override file values.

use crate::analyzer::workload::types::RuleFamily;
use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How many findings one resource can produce per rule family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationScope {
    /// Stop scanning a resource at its first violating container.
    #[default]
    FirstViolation,
    /// Report every violating container.
    AllContainers,
}

/// Configuration for an audit pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    /// Rule families to run. Empty means every family that can be configured.
    #[serde(default)]
    pub rules: Vec<RuleFamily>,

    /// Rule families to skip.
    #[serde(default)]
    pub exclude: Vec<RuleFamily>,

    /// Expected `name:tag` for the image rule.
    #[serde(default)]
    pub image: Option<String>,

    /// Namespace to list from the cluster. `None` lists all namespaces.
    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub scope: ViolationScope,
}

impl AuditConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule family to run.
    pub fn rule(mut self, family: RuleFamily) -> Self {
        if !self.rules.contains(&family) {
            self.rules.push(family);
        }
        self
    }

    /// Replace the rule selection.
    pub fn with_rules(mut self, families: impl IntoIterator<Item = RuleFamily>) -> Self {
        self.rules.clear();
        for family in families {
            self = self.rule(family);
        }
        self
    }

    pub fn exclude(mut self, family: RuleFamily) -> Self {
        self.exclude.push(family);
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_scope(mut self, scope: ViolationScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn is_excluded(&self, family: RuleFamily) -> bool {
        self.exclude.contains(&family)
    }

    /// The rule families a pass will instantiate, in launch order.
    ///
    /// With no explicit selection every family runs, except the image rule when
    /// no reference is configured.
    pub fn resolve_rules(&self) -> Vec<RuleFamily> {
        let selected: Vec<RuleFamily> = if self.rules.is_empty() {
            RuleFamily::ALL
                .into_iter()
                .filter(|family| *family != RuleFamily::Image || self.image.is_some())
                .collect()
        } else {
            self.rules.clone()
        };

        selected
            .into_iter()
            .filter(|family| !self.is_excluded(*family))
            .collect()
    }

    /// Load configuration from a YAML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AuditError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::load_from_str(&content)
            .map_err(|e| AuditError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load configuration from a YAML string. An empty document is the default config.
    pub fn load_from_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| AuditError::Config(e.to_string()))
    }

    /// Load config from the default locations (.kubeaudit.yaml, .kubeaudit.yml)
    /// in the working directory.
    pub fn load_from_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Load the first default config file found in `dir`.
    ///
    /// A missing file is `Ok(None)`; a file that exists but does not parse is
    /// an error.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        for filename in [".kubeaudit.yaml", ".kubeaudit.yml"] {
            let path = dir.join(filename);
            if path.is_file() {
                log::debug!("Loading configuration from {}", path.display());
                return Self::load_from_file(&path).map(Some);
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuditConfig::default();
        assert!(config.rules.is_empty());
        assert!(config.image.is_none());
        assert_eq!(config.scope, ViolationScope::FirstViolation);
        assert_eq!(
            config.resolve_rules(),
            vec![
                RuleFamily::Capabilities,
                RuleFamily::RunAsNonRoot,
                RuleFamily::ReadOnlyRootFs,
                RuleFamily::Privileged,
                RuleFamily::ServiceAccount,
            ]
        );
    }

    #[test]
    fn test_config_builder() {
        let config = AuditConfig::new()
            .rule(RuleFamily::RunAsNonRoot)
            .rule(RuleFamily::Privileged)
            .rule(RuleFamily::RunAsNonRoot)
            .exclude(RuleFamily::Privileged)
            .with_scope(ViolationScope::AllContainers);

        assert_eq!(config.rules.len(), 2);
        assert!(config.is_excluded(RuleFamily::Privileged));
        assert_eq!(config.resolve_rules(), vec![RuleFamily::RunAsNonRoot]);
        assert_eq!(config.scope, ViolationScope::AllContainers);
    }

    #[test]
    fn test_image_joins_default_selection_when_configured() {
        let config = AuditConfig::new().with_image("nginx:1.25");
        assert_eq!(config.resolve_rules().last(), Some(&RuleFamily::Image));
    }

    #[test]
    fn test_load_from_str() {
        let yaml = r#"
rules:
  - capabilities
  - image
exclude:
  - capabilities
image: gcr.io/google_containers/echoserver:1.7
namespace: payments
scope: all-containers
"#;
        let config = AuditConfig::load_from_str(yaml).unwrap();
        assert_eq!(config.resolve_rules(), vec![RuleFamily::Image]);
        assert_eq!(
            config.image.as_deref(),
            Some("gcr.io/google_containers/echoserver:1.7")
        );
        assert_eq!(config.namespace.as_deref(), Some("payments"));
        assert_eq!(config.scope, ViolationScope::AllContainers);
    }

    #[test]
    fn test_load_rejects_unknown_rule() {
        let err = AuditConfig::load_from_str("rules: [latest-tag]").unwrap_err();
        assert!(matches!(err, AuditError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".kubeaudit.yaml");
        std::fs::write(&path, "scope: first-violation\n").unwrap();

        let config = AuditConfig::load_from_file(&path).unwrap();
        assert_eq!(config.scope, ViolationScope::FirstViolation);

        let missing = AuditConfig::load_from_file(&dir.path().join("absent.yaml"));
        assert!(matches!(missing, Err(AuditError::Io { .. })));
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(AuditConfig::load_from_dir(dir.path()).unwrap(), None);

        std::fs::write(dir.path().join(".kubeaudit.yml"), "rules: [privileged]\n").unwrap();
        let config = AuditConfig::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.rules, vec![RuleFamily::Privileged]);
    }

    #[test]
    fn test_broken_default_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".kubeaudit.yaml"), "exclude: [privilegd]\n").unwrap();

        let err = AuditConfig::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, AuditError::Config(_)));
        assert!(err.to_string().contains(".kubeaudit.yaml"));
    }
}
