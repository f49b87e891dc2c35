//! YAML parsing for Kubernetes manifests.
//!
//! Multi-document streams and `kind: List` wrappers are flattened. Objects
//! that are not one of the five auditable workload kinds are skipped.

use crate::analyzer::workload::context::object::*;
use crate::analyzer::workload::extract::has_pod_spec;
use crate::analyzer::workload::types::ResourceKind;
use crate::error::{AuditError, Result};
use serde::Deserialize;
use std::path::Path;

/// Parse a YAML string containing one or more Kubernetes objects.
pub fn parse_yaml(content: &str) -> Result<Vec<Resource>> {
    parse_yaml_with_path(content, Path::new("<stdin>"))
}

/// Parse YAML content with a source file path used in error messages.
pub fn parse_yaml_with_path(content: &str, path: &Path) -> Result<Vec<Resource>> {
    let mut resources = Vec::new();

    for document in serde_yaml::Deserializer::from_str(content) {
        let value = serde_yaml::Value::deserialize(document).map_err(|source| {
            AuditError::Manifest {
                path: path.to_path_buf(),
                source,
            }
        })?;
        collect_resources(&value, &mut resources);
    }

    log::debug!("Parsed {} workload(s) from {}", resources.len(), path.display());
    Ok(resources)
}

/// Parse a YAML file.
pub fn parse_yaml_file(path: &Path) -> Result<Vec<Resource>> {
    let content = std::fs::read_to_string(path).map_err(|source| AuditError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_yaml_with_path(&content, path)
}

/// Parse all YAML files in a directory (recursively), in file-name order.
///
/// Files that fail to parse are skipped with a warning.
pub fn parse_yaml_dir(path: &Path) -> Result<Vec<Resource>> {
    if !path.is_dir() {
        return Err(AuditError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let mut resources = Vec::new();
    for entry in walkdir::WalkDir::new(path)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let entry_path = entry.path();
        if !entry_path.is_file() {
            continue;
        }
        let ext = entry_path.extension().and_then(|e| e.to_str());
        if !matches!(ext, Some("yaml") | Some("yml")) {
            continue;
        }

        match parse_yaml_file(entry_path) {
            Ok(mut parsed) => resources.append(&mut parsed),
            Err(e) => log::warn!("Skipping {}: {}", entry_path.display(), e),
        }
    }

    Ok(resources)
}

/// Load a manifest file or a directory of manifests.
pub fn load_path(path: &Path) -> Result<Vec<Resource>> {
    if path.is_dir() {
        parse_yaml_dir(path)
    } else {
        parse_yaml_file(path)
    }
}

fn collect_resources(value: &serde_yaml::Value, out: &mut Vec<Resource>) {
    if value.is_null() {
        return;
    }

    let Some(kind) = get_string(value, "kind") else {
        log::debug!("Skipping document without a kind");
        return;
    };

    if kind.ends_with("List") {
        if let Some(items) = value.get("items").and_then(|i| i.as_sequence()) {
            for item in items {
                collect_resources(item, out);
            }
        }
        return;
    }

    match parse_resource(value, &kind) {
        Some(resource) => {
            if !has_pod_spec(&resource) {
                log::debug!("{} {} has no pod template", kind, resource.name());
            }
            out.push(resource);
        }
        None => log::debug!("Skipping unsupported kind {}", kind),
    }
}

fn parse_resource(value: &serde_yaml::Value, kind: &str) -> Option<Resource> {
    let resource: Resource = match ResourceKind::from_kind(kind)? {
        ResourceKind::Deployment => parse_deployment(value).into(),
        ResourceKind::StatefulSet => parse_statefulset(value).into(),
        ResourceKind::DaemonSet => parse_daemonset(value).into(),
        ResourceKind::ReplicationController => parse_replication_controller(value).into(),
        ResourceKind::Pod => parse_pod(value).into(),
    };
    Some(resource)
}

// ============================================================================
// Parse helper functions
// ============================================================================

fn get_string(value: &serde_yaml::Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(|s| s.to_string())
}

fn get_bool(value: &serde_yaml::Value, key: &str) -> Option<bool> {
    value.get(key)?.as_bool()
}

fn parse_metadata(value: &serde_yaml::Value) -> CommonMeta {
    let metadata = value.get("metadata");
    CommonMeta {
        name: metadata
            .and_then(|m| get_string(m, "name"))
            .unwrap_or_default(),
        namespace: metadata.and_then(|m| get_string(m, "namespace")),
    }
}

fn parse_template_pod_spec(value: &serde_yaml::Value) -> Option<PodSpec> {
    let spec = value.get("spec")?.get("template")?.get("spec")?;
    Some(parse_pod_spec_inner(spec))
}

fn parse_pod_spec_direct(value: &serde_yaml::Value) -> Option<PodSpec> {
    let spec = value.get("spec")?;
    Some(parse_pod_spec_inner(spec))
}

fn parse_pod_spec_inner(spec: &serde_yaml::Value) -> PodSpec {
    PodSpec {
        containers: parse_containers(spec.get("containers")),
        service_account: get_string(spec, "serviceAccount"),
        service_account_name: get_string(spec, "serviceAccountName"),
        automount_service_account_token: get_bool(spec, "automountServiceAccountToken"),
    }
}

fn parse_containers(containers: Option<&serde_yaml::Value>) -> Vec<ContainerSpec> {
    containers
        .and_then(|c| c.as_sequence())
        .map(|arr| arr.iter().map(parse_container).collect())
        .unwrap_or_default()
}

fn parse_container(c: &serde_yaml::Value) -> ContainerSpec {
    ContainerSpec {
        name: get_string(c, "name").unwrap_or_default(),
        image: get_string(c, "image"),
        security_context: parse_security_context(c.get("securityContext")),
    }
}

fn parse_security_context(sc: Option<&serde_yaml::Value>) -> Option<SecurityContext> {
    let sc = sc.filter(|v| !v.is_null())?;
    Some(SecurityContext {
        privileged: get_bool(sc, "privileged"),
        run_as_non_root: get_bool(sc, "runAsNonRoot"),
        read_only_root_filesystem: get_bool(sc, "readOnlyRootFilesystem"),
        capabilities: parse_capabilities(sc.get("capabilities")),
    })
}

fn parse_capabilities(caps: Option<&serde_yaml::Value>) -> Option<Capabilities> {
    let caps = caps.filter(|v| !v.is_null())?;
    Some(Capabilities {
        add: parse_string_array(caps.get("add")),
        drop: parse_string_array(caps.get("drop")),
    })
}

/// An absent list stays `None`; an explicit `[]` is `Some(vec![])`.
fn parse_string_array(value: Option<&serde_yaml::Value>) -> Option<Vec<String>> {
    let arr = value?.as_sequence()?;
    Some(
        arr.iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
    )
}

fn parse_deployment(value: &serde_yaml::Value) -> DeploymentData {
    DeploymentData {
        metadata: parse_metadata(value),
        pod_spec: parse_template_pod_spec(value),
    }
}

fn parse_statefulset(value: &serde_yaml::Value) -> StatefulSetData {
    StatefulSetData {
        metadata: parse_metadata(value),
        pod_spec: parse_template_pod_spec(value),
    }
}

fn parse_daemonset(value: &serde_yaml::Value) -> DaemonSetData {
    DaemonSetData {
        metadata: parse_metadata(value),
        pod_spec: parse_template_pod_spec(value),
    }
}

fn parse_replication_controller(value: &serde_yaml::Value) -> ReplicationControllerData {
    ReplicationControllerData {
        metadata: parse_metadata(value),
        pod_spec: parse_template_pod_spec(value),
    }
}

fn parse_pod(value: &serde_yaml::Value) -> PodData {
    PodData {
        metadata: parse_metadata(value),
        spec: parse_pod_spec_direct(value),
    }
}
