//! Run as non-root rule.

use crate::analyzer::workload::context::{ContainerSpec, PodSpec};
use crate::analyzer::workload::rules::{Rule, check_security_context_flag};
use crate::analyzer::workload::types::{ErrorCode, RuleFamily, Verdict};

/// Requires `securityContext.runAsNonRoot: true` on every container.
pub struct RunAsNonRootRule;

impl Rule for RunAsNonRootRule {
    fn family(&self) -> RuleFamily {
        RuleFamily::RunAsNonRoot
    }

    fn check(&self, container: &ContainerSpec, _pod: &PodSpec) -> Verdict {
        check_security_context_flag(
            container,
            |sc| sc.run_as_non_root,
            ErrorCode::RunAsNonRootUnset,
            false,
            ErrorCode::RunAsNonRootFalse,
        )
    }
}
