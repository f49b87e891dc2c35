//! Privileged container rule.

use crate::analyzer::workload::context::{ContainerSpec, PodSpec};
use crate::analyzer::workload::rules::{Rule, check_security_context_flag};
use crate::analyzer::workload::types::{ErrorCode, RuleFamily, Verdict};

/// Flags privileged containers. An unset flag defaults to false in Kubernetes,
/// so it is only a warning.
pub struct PrivilegedRule;

impl Rule for PrivilegedRule {
    fn family(&self) -> RuleFamily {
        RuleFamily::Privileged
    }

    fn check(&self, container: &ContainerSpec, _pod: &PodSpec) -> Verdict {
        check_security_context_flag(
            container,
            |sc| sc.privileged,
            ErrorCode::PrivilegedUnset,
            true,
            ErrorCode::PrivilegedTrue,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::workload::context::Workload;
    use crate::analyzer::workload::parser::yaml::parse_yaml;
    use crate::analyzer::workload::types::Severity;

    #[test]
    fn test_privileged_container_detected() {
        let yaml = r#"
apiVersion: apps/v1
kind: DaemonSet
metadata:
  name: node-exporter
spec:
  template:
    spec:
      containers:
      - name: exporter
        image: prom/node-exporter:v1.8.0
        securityContext:
          privileged: true
"#;
        let resources = parse_yaml(yaml).unwrap();
        let spec = resources[0].pod_spec().unwrap();
        let verdict = PrivilegedRule.check(&spec.containers[0], spec);
        assert_eq!(verdict.code(), ErrorCode::PrivilegedTrue);
        assert_eq!(verdict.code().severity(), Severity::Error);
    }

    #[test]
    fn test_unset_is_warning_and_false_passes() {
        let yaml = r#"
apiVersion: apps/v1
kind: DaemonSet
metadata:
  name: node-exporter
spec:
  template:
    spec:
      containers:
      - name: unset
        image: prom/node-exporter:v1.8.0
        securityContext:
          runAsNonRoot: true
      - name: explicit
        image: prom/node-exporter:v1.8.0
        securityContext:
          privileged: false
"#;
        let resources = parse_yaml(yaml).unwrap();
        let spec = resources[0].pod_spec().unwrap();

        let unset = PrivilegedRule.check(&spec.containers[0], spec).code();
        assert_eq!(unset, ErrorCode::PrivilegedUnset);
        assert_eq!(unset.severity(), Severity::Warning);
        assert_eq!(
            PrivilegedRule.check(&spec.containers[1], spec),
            Verdict::Pass
        );
    }
}
