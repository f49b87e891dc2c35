//! Rule families.
//!
//! Every rule is a small decision procedure over one container (and the pod
//! spec that owns it). Rules return a [`Verdict`]; they never mutate shared
//! state, so one instance is safely shared by every concurrent audit task.

pub mod capabilities;
pub mod image;
pub mod privileged;
pub mod readonlyrootfs;
pub mod runasnonroot;
pub mod serviceaccount;

use crate::analyzer::workload::config::AuditConfig;
use crate::analyzer::workload::context::{ContainerSpec, PodSpec, SecurityContext};
use crate::analyzer::workload::types::{ErrorCode, RuleFamily, Verdict};
use crate::error::{AuditError, Result};
use std::sync::Arc;

/// A check run against every container of every resource.
pub trait Rule: Send + Sync {
    fn family(&self) -> RuleFamily;

    /// Decide the verdict for one container.
    fn check(&self, container: &ContainerSpec, pod: &PodSpec) -> Verdict;
}

/// Instantiate the rule for a family.
///
/// Only the image rule can fail, when its reference is missing or malformed.
pub fn instantiate(family: RuleFamily, config: &AuditConfig) -> Result<Arc<dyn Rule>> {
    let rule: Arc<dyn Rule> = match family {
        RuleFamily::Capabilities => Arc::new(capabilities::CapabilitiesRule),
        RuleFamily::RunAsNonRoot => Arc::new(runasnonroot::RunAsNonRootRule),
        RuleFamily::ReadOnlyRootFs => Arc::new(readonlyrootfs::ReadOnlyRootFsRule),
        RuleFamily::Privileged => Arc::new(privileged::PrivilegedRule),
        RuleFamily::ServiceAccount => Arc::new(serviceaccount::ServiceAccountRule),
        RuleFamily::Image => {
            let reference = config
                .image
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .ok_or(AuditError::MissingImageReference)?;
            Arc::new(image::ImageRule::new(reference)?)
        }
    };
    Ok(rule)
}

/// Shared shape of the boolean security-context rules:
/// context absent, field unset, field set to the insecure value, otherwise pass.
pub(crate) fn check_security_context_flag(
    container: &ContainerSpec,
    field: impl Fn(&SecurityContext) -> Option<bool>,
    unset: ErrorCode,
    insecure_value: bool,
    insecure: ErrorCode,
) -> Verdict {
    let Some(sc) = container.security_context.as_ref() else {
        return Verdict::violation(ErrorCode::SecurityContextMissing);
    };

    match field(sc) {
        None => Verdict::violation(unset),
        Some(value) if value == insecure_value => Verdict::violation(insecure),
        Some(_) => Verdict::Pass,
    }
}
