use std::process::ExitCode;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};

use stackup::adapter::inbound::cli::{self, command::Cli, output};
use stackup::error::Error;

/// Conventional exit status for SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tokio::select! {
        result = cli::run(cli) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!(error = %e, "Fatal error");
                match &e {
                    Error::Stage(failure) => {
                        output::error(&format!("{} failed: {}", failure.stage, failure.cause));
                    }
                    other => output::error(&other.to_string()),
                }
                ExitCode::FAILURE
            }
        },
        _ = signal::ctrl_c() => {
            info!("Interrupted");
            output::error("interrupted");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}
