//! Read-only root filesystem rule.

use crate::analyzer::workload::context::{ContainerSpec, PodSpec};
use crate::analyzer::workload::rules::{Rule, check_security_context_flag};
use crate::analyzer::workload::types::{ErrorCode, RuleFamily, Verdict};

pub struct ReadOnlyRootFsRule;

impl Rule for ReadOnlyRootFsRule {
    fn family(&self) -> RuleFamily {
        RuleFamily::ReadOnlyRootFs
    }

    fn check(&self, container: &ContainerSpec, _pod: &PodSpec) -> Verdict {
        check_security_context_flag(
            container,
            |sc| sc.read_only_root_filesystem,
            ErrorCode::ReadOnlyRootFilesystemUnset,
            false,
            ErrorCode::ReadOnlyRootFilesystemFalse,
        )
    }
}
