//! Audit orchestration.
//!
//! An audit task binds one resource collection to one rule family. The
//! [`Auditor`] launches one task per (rule family, collection) pair on a
//! `JoinSet` it owns and returns once every task has finished.

use crate::analyzer::workload::config::{AuditConfig, ViolationScope};
use crate::analyzer::workload::context::ResourceCollection;
use crate::analyzer::workload::extract;
use crate::analyzer::workload::formatter::Reporter;
use crate::analyzer::workload::rules::{self, Rule};
use crate::analyzer::workload::types::{Finding, ResourceKind, RuleFamily};
use crate::error::{AuditError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Run one rule over every resource of a collection.
///
/// Under [`ViolationScope::FirstViolation`] a resource contributes at most one
/// finding: scanning stops at its first violating container.
pub fn audit_collection(
    collection: &ResourceCollection,
    rule: &dyn Rule,
    scope: ViolationScope,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    for resource in collection {
        let extraction = extract::extract(resource);
        let Some(pod) = extraction.pod_spec else {
            continue;
        };

        let mut violations = extraction.containers.iter().filter_map(|container| {
            rule.check(container, pod).into_violation().map(|violation| {
                extraction
                    .template
                    .clone()
                    .with_violation(&container.name, violation)
            })
        });

        match scope {
            ViolationScope::FirstViolation => findings.extend(violations.next()),
            ViolationScope::AllContainers => findings.extend(violations),
        }
    }

    findings
}

/// Findings of one (rule family, collection) task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskReport {
    pub family: RuleFamily,
    /// `None` when the collection was a mixed manifest group.
    pub kind: Option<ResourceKind>,
    pub findings: Vec<Finding>,
}

/// Result of one audit pass.
#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    /// Task results in launch order.
    pub tasks: Vec<TaskReport>,
    /// Infrastructure errors that disabled part of the pass.
    pub errors: Vec<String>,
}

impl AuditReport {
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.tasks.iter().flat_map(|task| task.findings.iter())
    }

    pub fn total_findings(&self) -> usize {
        self.tasks.iter().map(|task| task.findings.len()).sum()
    }

    pub fn findings_for(&self, family: RuleFamily) -> Vec<&Finding> {
        self.tasks
            .iter()
            .filter(|task| task.family == family)
            .flat_map(|task| task.findings.iter())
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Runs the configured rule families over resource collections.
pub struct Auditor {
    rules: Vec<Arc<dyn Rule>>,
    scope: ViolationScope,
    reporter: Arc<dyn Reporter>,
    config_errors: Vec<String>,
}

impl Auditor {
    pub fn new(
        rules: Vec<Arc<dyn Rule>>,
        scope: ViolationScope,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            rules,
            scope,
            reporter,
            config_errors: Vec::new(),
        }
    }

    /// Instantiate every rule family the configuration selects.
    ///
    /// A family that cannot be instantiated is reported and skipped; the
    /// others still run. Fails only when no family is left.
    pub fn from_config(config: &AuditConfig, reporter: Arc<dyn Reporter>) -> Result<Self> {
        let families = config.resolve_rules();
        if families.is_empty() {
            return Err(AuditError::NoRules(
                "every rule family is excluded".to_string(),
            ));
        }

        let mut rules = Vec::with_capacity(families.len());
        let mut config_errors = Vec::new();
        for family in families {
            match rules::instantiate(family, config) {
                Ok(rule) => rules.push(rule),
                Err(e) => {
                    log::debug!("Skipping rule family {}: {}", family, e);
                    reporter.report_error(&e);
                    config_errors.push(e.to_string());
                }
            }
        }

        if rules.is_empty() {
            return Err(AuditError::NoRules(config_errors.join("; ")));
        }

        Ok(Self {
            rules,
            scope: config.scope,
            reporter,
            config_errors,
        })
    }

    pub fn families(&self) -> Vec<RuleFamily> {
        self.rules.iter().map(|rule| rule.family()).collect()
    }

    /// Run every rule over every collection concurrently.
    ///
    /// Returns after all tasks have completed. A panicking task is recorded
    /// in [`AuditReport::errors`]; the remaining tasks are unaffected.
    pub async fn run(&self, collections: &[Arc<ResourceCollection>]) -> AuditReport {
        let mut tasks = JoinSet::new();
        let mut launched = HashMap::new();
        let mut slots: Vec<Option<TaskReport>> = Vec::new();

        for rule in &self.rules {
            for collection in collections {
                let index = slots.len();
                slots.push(None);

                let family = rule.family();
                let kind = collection.kind();
                let rule = Arc::clone(rule);
                let collection = Arc::clone(collection);
                let reporter = Arc::clone(&self.reporter);
                let scope = self.scope;

                let handle = tasks.spawn(async move {
                    let findings = audit_collection(&collection, rule.as_ref(), scope);
                    reporter.report(family, kind, &findings);
                    (
                        index,
                        TaskReport {
                            family,
                            kind,
                            findings,
                        },
                    )
                });
                launched.insert(handle.id(), (family, kind));
            }
        }

        log::debug!("Launched {} audit tasks", slots.len());

        let mut errors = self.config_errors.clone();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, report)) => slots[index] = Some(report),
                Err(e) => {
                    let (family, kind) = match launched.get(&e.id()) {
                        Some((family, kind)) => (family.to_string(), describe_kind(*kind)),
                        None => ("unknown".to_string(), "unknown".to_string()),
                    };
                    let error = AuditError::TaskFailed {
                        family,
                        kind,
                        message: e.to_string(),
                    };
                    self.reporter.report_error(&error);
                    errors.push(error.to_string());
                }
            }
        }

        AuditReport {
            tasks: slots.into_iter().flatten().collect(),
            errors,
        }
    }
}

fn describe_kind(kind: Option<ResourceKind>) -> String {
    kind.map(|k| k.to_string())
        .unwrap_or_else(|| "manifest".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::workload::context::{
        CommonMeta, ContainerSpec, DeploymentData, PodData, PodSpec, Resource, SecurityContext,
    };
    use crate::analyzer::workload::parser::yaml::parse_yaml;
    use crate::analyzer::workload::types::{ErrorCode, Verdict};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingReporter {
        calls: Mutex<Vec<(RuleFamily, Option<ResourceKind>, usize)>>,
        errors: Mutex<Vec<String>>,
    }

    impl Reporter for CollectingReporter {
        fn report(&self, family: RuleFamily, kind: Option<ResourceKind>, findings: &[Finding]) {
            self.calls
                .lock()
                .unwrap()
                .push((family, kind, findings.len()));
        }

        fn report_error(&self, error: &AuditError) {
            self.errors.lock().unwrap().push(error.to_string());
        }
    }

    fn bare_container(name: &str) -> ContainerSpec {
        ContainerSpec {
            name: name.to_string(),
            image: Some("nginx:1.25".into()),
            security_context: None,
        }
    }

    fn hardened_container(name: &str) -> ContainerSpec {
        ContainerSpec {
            name: name.to_string(),
            image: Some("nginx:1.25".into()),
            security_context: Some(SecurityContext {
                run_as_non_root: Some(true),
                ..Default::default()
            }),
        }
    }

    fn deployment(name: &str, containers: Vec<ContainerSpec>) -> Resource {
        DeploymentData {
            metadata: CommonMeta::new(name, Some("default")),
            pod_spec: Some(PodSpec {
                containers,
                ..Default::default()
            }),
        }
        .into()
    }

    fn nonroot_auditor(scope: ViolationScope) -> (Auditor, Arc<CollectingReporter>) {
        let reporter = Arc::new(CollectingReporter::default());
        let config = AuditConfig::new()
            .rule(RuleFamily::RunAsNonRoot)
            .with_scope(scope);
        let auditor = Auditor::from_config(&config, reporter.clone()).unwrap();
        (auditor, reporter)
    }

    #[test]
    fn test_first_violation_truncates_per_resource() {
        let collection = ResourceCollection::typed(
            ResourceKind::Deployment,
            vec![deployment(
                "two-bad",
                vec![
                    hardened_container("ok"),
                    bare_container("first"),
                    bare_container("second"),
                ],
            )],
        );
        let rule = rules::runasnonroot::RunAsNonRootRule;

        let findings = audit_collection(&collection, &rule, ViolationScope::FirstViolation);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].container.as_deref(), Some("first"));
        assert_eq!(findings[0].code, ErrorCode::SecurityContextMissing);

        let findings = audit_collection(&collection, &rule, ViolationScope::AllContainers);
        let containers: Vec<_> = findings.iter().filter_map(|f| f.container.as_deref()).collect();
        assert_eq!(containers, vec!["first", "second"]);
    }

    #[test]
    fn test_resources_without_template_are_skipped() {
        let collection = ResourceCollection::typed(
            ResourceKind::Pod,
            vec![
                PodData {
                    metadata: CommonMeta::new("no-spec", None),
                    spec: None,
                }
                .into(),
            ],
        );
        let findings = audit_collection(
            &collection,
            &rules::privileged::PrivilegedRule,
            ViolationScope::FirstViolation,
        );
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_five_kinds_all_complete() {
        let yaml = r#"
apiVersion: apps/v1
kind: Deployment
metadata: {name: d, namespace: ns}
spec: {template: {spec: {containers: [{name: c, image: "a:1"}]}}}
---
apiVersion: apps/v1
kind: StatefulSet
metadata: {name: s, namespace: ns}
spec: {template: {spec: {containers: [{name: c, image: "a:1"}]}}}
---
apiVersion: apps/v1
kind: DaemonSet
metadata: {name: ds, namespace: ns}
spec: {template: {spec: {containers: [{name: c, image: "a:1"}]}}}
---
apiVersion: v1
kind: ReplicationController
metadata: {name: rc, namespace: ns}
spec: {template: {spec: {containers: [{name: c, image: "a:1"}]}}}
---
apiVersion: v1
kind: Pod
metadata: {name: p, namespace: ns}
spec: {containers: [{name: c, image: "a:1"}, {name: c2, image: "a:1"}]}
"#;
        let collections: Vec<Arc<ResourceCollection>> =
            ResourceCollection::by_kind(parse_yaml(yaml).unwrap())
                .into_iter()
                .map(Arc::new)
                .collect();

        let (auditor, reporter) = nonroot_auditor(ViolationScope::FirstViolation);
        let report = auditor.run(&collections).await;

        assert_eq!(report.tasks.len(), 5);
        assert_eq!(report.total_findings(), 5);
        let kinds: Vec<_> = report.tasks.iter().filter_map(|t| t.kind).collect();
        assert_eq!(kinds, ResourceKind::ALL.to_vec());
        assert!(report.tasks.iter().all(|t| t.findings.len() == 1));
        assert_eq!(reporter.calls.lock().unwrap().len(), 5);
        assert!(!report.has_errors());
    }

    #[tokio::test]
    async fn test_two_passes_are_identical() {
        let collections = vec![Arc::new(ResourceCollection::typed(
            ResourceKind::Deployment,
            (0..20)
                .map(|i| deployment(&format!("d{i}"), vec![bare_container("app")]))
                .collect::<Vec<_>>(),
        ))];

        let reporter = Arc::new(CollectingReporter::default());
        let auditor = Auditor::from_config(&AuditConfig::default(), reporter).unwrap();

        let first = auditor.run(&collections).await;
        let second = auditor.run(&collections).await;
        assert_eq!(first.tasks, second.tasks);
        assert_eq!(first.tasks.len(), 5);
    }

    #[tokio::test]
    async fn test_empty_collections_produce_no_findings() {
        let collections: Vec<Arc<ResourceCollection>> = ResourceCollection::by_kind(Vec::new())
            .into_iter()
            .map(Arc::new)
            .collect();

        let (auditor, reporter) = nonroot_auditor(ViolationScope::FirstViolation);
        let report = auditor.run(&collections).await;
        assert_eq!(report.tasks.len(), 5);
        assert_eq!(report.total_findings(), 0);
        assert!(report.errors.is_empty());
        assert!(reporter.calls.lock().unwrap().iter().all(|(_, _, n)| *n == 0));
    }

    #[tokio::test]
    async fn test_malformed_image_reference_keeps_other_rules() {
        let reporter = Arc::new(CollectingReporter::default());
        let config = AuditConfig::new()
            .rule(RuleFamily::Image)
            .rule(RuleFamily::RunAsNonRoot)
            .with_image("repo/app");
        let auditor = Auditor::from_config(&config, reporter.clone()).unwrap();
        assert_eq!(auditor.families(), vec![RuleFamily::RunAsNonRoot]);

        let collections = vec![Arc::new(ResourceCollection::typed(
            ResourceKind::Deployment,
            vec![deployment("web", vec![bare_container("app")])],
        ))];
        let report = auditor.run(&collections).await;
        assert_eq!(report.total_findings(), 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("repo/app"));
        assert_eq!(reporter.errors.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_no_rules_is_an_error() {
        let reporter = Arc::new(CollectingReporter::default());
        let config = AuditConfig::new().rule(RuleFamily::Image);
        assert!(matches!(
            Auditor::from_config(&config, reporter),
            Err(AuditError::NoRules(_))
        ));
    }

    struct PanickingRule;

    impl Rule for PanickingRule {
        fn family(&self) -> RuleFamily {
            RuleFamily::Privileged
        }

        fn check(&self, _container: &ContainerSpec, _pod: &PodSpec) -> Verdict {
            panic!("rule blew up")
        }
    }

    #[tokio::test]
    async fn test_panicking_task_is_recorded() {
        let reporter = Arc::new(CollectingReporter::default());
        let auditor = Auditor::new(
            vec![
                Arc::new(PanickingRule),
                Arc::new(rules::runasnonroot::RunAsNonRootRule),
            ],
            ViolationScope::FirstViolation,
            reporter,
        );
        let collections = vec![Arc::new(ResourceCollection::typed(
            ResourceKind::Deployment,
            vec![deployment("web", vec![bare_container("app")])],
        ))];

        let report = auditor.run(&collections).await;
        assert_eq!(report.tasks.len(), 1);
        assert_eq!(report.tasks[0].family, RuleFamily::RunAsNonRoot);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("privileged"));
    }
}
