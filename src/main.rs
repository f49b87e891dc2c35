use clap::Parser;
use kubeaudit::cli::Cli;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging();

    if let Err(e) = kubeaudit::run_command(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
