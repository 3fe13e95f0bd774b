//! # fwumd CLI
//!
//! The binary is thin: the CLI lives in `cli/`, and this file only sets up
//! logging, invokes `cli::run()` and turns an error into exit status 1.
//!
//! Logging goes to stderr through `tracing-subscriber`. The filter is read
//! from `FWUMD_LOG` (for example `FWUMD_LOG=debug` or
//! `FWUMD_LOG=fwumd::binary=debug`) and defaults to `warn`.

use tracing_subscriber::EnvFilter;

mod cli;

const LOG_ENV: &str = "FWUMD_LOG";

fn main() {
    init_tracing();
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
