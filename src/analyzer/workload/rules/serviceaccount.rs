//! Service account token rule.
//!
//! The checked fields live on the pod spec, so every container of a pod gets the
//! same verdict. Under first-violation scope that still yields one finding per
//! resource, attributed to the first container.

use crate::analyzer::workload::context::{ContainerSpec, PodSpec};
use crate::analyzer::workload::rules::Rule;
use crate::analyzer::workload::types::{ErrorCode, RuleFamily, Verdict};

const DEFAULT_SERVICE_ACCOUNT: &str = "default";

pub struct ServiceAccountRule;

impl Rule for ServiceAccountRule {
    fn family(&self) -> RuleFamily {
        RuleFamily::ServiceAccount
    }

    fn check(&self, _container: &ContainerSpec, pod: &PodSpec) -> Verdict {
        if pod
            .service_account
            .as_deref()
            .is_some_and(|name| !name.is_empty())
        {
            return Verdict::violation(ErrorCode::DeprecatedServiceAccount);
        }

        if !uses_default_account(pod) {
            return Verdict::Pass;
        }

        match pod.automount_service_account_token {
            None => Verdict::violation(ErrorCode::AutomountServiceAccountTokenUnset),
            Some(true) => Verdict::violation(ErrorCode::AutomountServiceAccountTokenTrue),
            Some(false) => Verdict::Pass,
        }
    }
}

fn uses_default_account(pod: &PodSpec) -> bool {
    match pod.service_account_name.as_deref() {
        None | Some("") => true,
        Some(name) => name == DEFAULT_SERVICE_ACCOUNT,
    }
}
