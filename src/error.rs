use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuditError>;

/// Infrastructure failures. Rule violations are never errors; they are findings.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML syntax error in {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Image does not contain name and tag: '{0}'")]
    InvalidImageReference(String),

    #[error("Empty image name. Are you missing the image flag?")]
    MissingImageReference,

    #[error("No rule could be run: {0}")]
    NoRules(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to infer Kubernetes config: {0}")]
    InferConfig(#[from] kube::config::InferConfigError),

    #[error("Failed to read kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Failed to list {kind}: {message}")]
    Listing { kind: String, message: String },

    #[error("Audit task for {family} on {kind} failed: {message}")]
    TaskFailed {
        family: String,
        kind: String,
        message: String,
    },
}
