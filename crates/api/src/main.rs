//! Kimai - time tracking server and maintenance CLI

use std::process::ExitCode;

use clap::Parser;
use kimai_lib::cli::{self, Cli};
use kimai_lib::utils::init_logging;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    // Logging first so config loading is visible
    init_logging(cli.log_format);
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => warn!(error = %err, "could not load .env file"),
    }

    match run(cli).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(err) => {
            error!(error = %err, "kimai command failed");
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = cli::load_config(cli.config)?;
    Ok(cli::run(cli.command, config).await?)
}
