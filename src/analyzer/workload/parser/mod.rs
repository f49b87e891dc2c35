//! Manifest parsing for workload resources.

pub mod yaml;

pub use yaml::{load_path, parse_yaml, parse_yaml_dir, parse_yaml_file, parse_yaml_with_path};
