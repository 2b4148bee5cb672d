use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use nomctl::cli::{self, session::Session, Cli};

/// Exit status for errors the user can fix by changing the invocation.
const EXIT_USAGE: u8 = 2;

fn init_tracing(level: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let session = match Session::from_cli(&args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error! {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&session.config.log_level);

    match cli::run(args.command, &session) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error! {}", e);
            if e.is_recoverable() {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
