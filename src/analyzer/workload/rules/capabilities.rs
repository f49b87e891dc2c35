//! Capability dropping rule.

use crate::analyzer::workload::context::{ContainerSpec, PodSpec};
use crate::analyzer::workload::rules::Rule;
use crate::analyzer::workload::types::{
    ErrorCode, FindingDetails, RuleFamily, Verdict, Violation,
};

/// Flags containers that add capabilities or never drop any.
pub struct CapabilitiesRule;

impl Rule for CapabilitiesRule {
    fn family(&self) -> RuleFamily {
        RuleFamily::Capabilities
    }

    fn check(&self, container: &ContainerSpec, _pod: &PodSpec) -> Verdict {
        let Some(sc) = &container.security_context else {
            return Verdict::violation(ErrorCode::SecurityContextMissing);
        };
        let Some(caps) = &sc.capabilities else {
            return Verdict::violation(ErrorCode::CapabilitiesMissing);
        };

        let added = caps.add.as_ref().filter(|add| !add.is_empty());
        let dropped = caps.drop.is_some();
        if added.is_none() && dropped {
            return Verdict::Pass;
        }

        Verdict::Violation(Violation::with_details(
            ErrorCode::CapabilitiesAddedOrNotDropped,
            FindingDetails {
                caps_added: added.cloned(),
                caps_dropped: Some(dropped),
                ..Default::default()
            },
        ))
    }
}
