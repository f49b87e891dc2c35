// Handler modules
pub mod audit;
pub mod version;

// Re-export all handler functions
pub use audit::{AuditOptions, build_config, handle_audit};
pub use version::handle_version;
