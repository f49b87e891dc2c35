//! Image tag pinning rule.

use crate::analyzer::workload::context::{ContainerSpec, PodSpec};
use crate::analyzer::workload::rules::Rule;
use crate::analyzer::workload::types::{
    ErrorCode, FindingDetails, RuleFamily, Verdict, Violation,
};
use crate::error::{AuditError, Result};
use std::fmt;

/// A parsed `name[:tag][@digest]` image reference.
///
/// The tag separator is the last `:` after the last `/`, so a registry port
/// stays part of the name (`registry:5000/app`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub name: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageReference {
    pub fn parse(reference: &str) -> Self {
        let reference = reference.trim();
        let (rest, digest) = match reference.split_once('@') {
            Some((rest, digest)) => (rest, Some(digest.to_string())),
            None => (reference, None),
        };

        let path_start = rest.rfind('/').map(|i| i + 1).unwrap_or(0);
        match rest[path_start..].rfind(':') {
            Some(i) => {
                let split = path_start + i;
                let tag = &rest[split + 1..];
                Self {
                    name: rest[..split].to_string(),
                    tag: (!tag.is_empty()).then(|| tag.to_string()),
                    digest,
                }
            }
            None => Self {
                name: rest.to_string(),
                tag: None,
                digest,
            },
        }
    }

    /// Parse a reference that must carry both a name and a tag.
    pub fn parse_required(reference: &str) -> Result<Self> {
        let parsed = Self::parse(reference);
        if parsed.name.is_empty() || parsed.tag.is_none() {
            return Err(AuditError::InvalidImageReference(reference.to_string()));
        }
        Ok(parsed)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

/// Compares containers running the configured image against its expected tag.
/// Containers running other images pass.
pub struct ImageRule {
    expected: ImageReference,
}

impl ImageRule {
    pub fn new(reference: &str) -> Result<Self> {
        Ok(Self {
            expected: ImageReference::parse_required(reference)?,
        })
    }
}

impl Rule for ImageRule {
    fn family(&self) -> RuleFamily {
        RuleFamily::Image
    }

    fn check(&self, container: &ContainerSpec, _pod: &PodSpec) -> Verdict {
        let observed = ImageReference::parse(container.image.as_deref().unwrap_or_default());
        if observed.name != self.expected.name {
            return Verdict::Pass;
        }

        match observed.tag {
            None => Verdict::Violation(Violation::with_details(
                ErrorCode::ImageTagMissing,
                FindingDetails {
                    image_name: Some(observed.name),
                    ..Default::default()
                },
            )),
            Some(tag) if Some(&tag) != self.expected.tag.as_ref() => {
                Verdict::Violation(Violation::with_details(
                    ErrorCode::ImageTagIncorrect,
                    FindingDetails {
                        image_name: Some(observed.name),
                        image_tag: Some(tag),
                        ..Default::default()
                    },
                ))
            }
            Some(_) => Verdict::Pass,
        }
    }
}
