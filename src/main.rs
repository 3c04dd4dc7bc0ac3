//! Blobstore CLI.
//!
//! Upload, download, append to, list and delete objects in the blobstore.

use clap::{CommandFactory, Parser};
use std::process::ExitCode;
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use blobstore::cli;
use blobstore::config::{Args, Config};
use blobstore::error::Result;
use blobstore::sdk::{default_chain, BlobStoreClient};
use blobstore::VERSION;

async fn execute(args: &Args) -> Result<()> {
    let config = Config::from(args);
    config.validate()?;

    debug!("blobstore-cli v{}", VERSION);
    debug!("Base URL: {}", config.base_url);

    let client = BlobStoreClient::with_timeout(&config.base_url, default_chain(), config.timeout())?;

    let mut stdout = tokio::io::stdout();
    cli::run(&args.command, &client, &mut stdout).await
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version also arrive here
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    // Initialize logging
    let log_level = if args.debug { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    match execute(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", Args::command().render_usage());
            ExitCode::FAILURE
        }
    }
}
