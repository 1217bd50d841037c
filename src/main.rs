use clap::Parser;
use tracing_subscriber::EnvFilter;

use arm_eeprom::cli::{self, Cli};

fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run(Cli::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
