use crate::analyzer::workload::types::RuleFamily;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kubeaudit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Audit Kubernetes workloads for security hardening")]
#[command(long_about = "Audits the containers of Deployments, StatefulSets, DaemonSets, ReplicationControllers and standalone Pods against security hardening rules, either from a live cluster or from manifest files.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (defaults to .kubeaudit.yaml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Audit a manifest file or directory instead of a live cluster
    #[arg(short = 'f', long, global = true, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Path to the kubeconfig file
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, global = true, value_name = "NAME")]
    pub context: Option<String>,

    /// Only audit resources in this namespace
    #[arg(short, long, global = true, value_name = "NAMESPACE")]
    pub namespace: Option<String>,

    /// Report every violating container instead of the first per resource
    #[arg(long, global = true)]
    pub all_containers: bool,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print findings as JSON lines
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audit container security contexts (capabilities by default)
    Sc {
        #[command(subcommand)]
        rule: Option<ScRule>,
    },

    /// Audit service account tokens and deprecated service account fields
    Sat,

    /// Audit containers against an expected image:tag
    Image {
        /// Expected image, e.g. gcr.io/google_containers/echoserver:1.7
        #[arg(short, long, value_name = "NAME:TAG")]
        image: Option<String>,
    },

    /// Run every audit
    All {
        /// Expected image for the image audit
        #[arg(short, long, value_name = "NAME:TAG")]
        image: Option<String>,
    },

    /// Print the version
    Version,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScRule {
    /// Audit runAsNonRoot
    Nonroot,
    /// Audit readOnlyRootFilesystem
    Rootfs,
    /// Audit privileged
    Priv,
}

impl ScRule {
    pub fn family(&self) -> RuleFamily {
        match self {
            Self::Nonroot => RuleFamily::RunAsNonRoot,
            Self::Rootfs => RuleFamily::ReadOnlyRootFs,
            Self::Priv => RuleFamily::Privileged,
        }
    }
}

impl Commands {
    /// Rule families the command selects. `None` defers to the configuration.
    pub fn families(&self) -> Option<Vec<RuleFamily>> {
        match self {
            Self::Sc { rule } => Some(vec![
                rule.map(|r| r.family()).unwrap_or(RuleFamily::Capabilities),
            ]),
            Self::Sat => Some(vec![RuleFamily::ServiceAccount]),
            Self::Image { .. } => Some(vec![RuleFamily::Image]),
            Self::All { .. } | Self::Version => None,
        }
    }
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let mut builder = env_logger::Builder::from_default_env();
        if let Some(level) = level_override(self.verbose, std::env::var_os("RUST_LOG").is_some()) {
            builder.filter_level(level);
        }
        builder.init();
    }
}

/// The global level to force on the logger. `RUST_LOG` wins unless `-v` is given.
fn level_override(verbose: u8, rust_log_set: bool) -> Option<log::LevelFilter> {
    match verbose {
        0 if rust_log_set => None,
        0 => Some(log::LevelFilter::Info),
        1 => Some(log::LevelFilter::Debug),
        _ => Some(log::LevelFilter::Trace),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sc_subcommands() {
        let cli = Cli::try_parse_from(["kubeaudit", "sc"]).unwrap();
        assert_eq!(cli.command.families(), Some(vec![RuleFamily::Capabilities]));

        let cli = Cli::try_parse_from(["kubeaudit", "sc", "rootfs"]).unwrap();
        assert_eq!(cli.command.families(), Some(vec![RuleFamily::ReadOnlyRootFs]));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "kubeaudit",
            "image",
            "-i",
            "nginx:1.25",
            "-f",
            "deploy.yaml",
            "--json",
            "-vv",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.manifest, Some(PathBuf::from("deploy.yaml")));
        match cli.command {
            Commands::Image { image } => assert_eq!(image.as_deref(), Some("nginx:1.25")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_all_defers_to_config() {
        let cli = Cli::try_parse_from(["kubeaudit", "-n", "prod", "all"]).unwrap();
        assert_eq!(cli.namespace.as_deref(), Some("prod"));
        assert_eq!(cli.command.families(), None);
    }

    #[test]
    fn test_unknown_sc_rule_rejected() {
        assert!(Cli::try_parse_from(["kubeaudit", "sc", "caps"]).is_err());
    }

    #[test]
    fn test_rust_log_wins_without_verbose_flag() {
        assert_eq!(level_override(0, true), None);
        assert_eq!(level_override(0, false), Some(log::LevelFilter::Info));
        assert_eq!(level_override(1, true), Some(log::LevelFilter::Debug));
        assert_eq!(level_override(3, false), Some(log::LevelFilter::Trace));
    }
}
