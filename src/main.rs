//! tunepull CLI entrypoint.
//!
//! Sets up tracing, dispatches the parsed command, and turns the run
//! summary's verdict into the process exit code.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tunepull::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let exit_code = Cli::parse().execute().await?;
    if exit_code != 0 {
        // Failed items were already listed in the summary
        std::process::exit(exit_code);
    }
    Ok(())
}
