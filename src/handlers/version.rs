use crate::VERSION;

pub fn version_string() -> String {
    format!("kubeaudit {}", VERSION)
}

pub fn handle_version() {
    println!("{}", version_string());
}
