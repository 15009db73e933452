mod api;
mod build;
mod cli;
mod config;
mod decisions;
mod enrich;
mod live;
mod loader;
mod pipeline;
mod report;
mod sync;
mod table;

use anyhow::Result;
use clap::Parser;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let failures = cli::run(cli).await?;
    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
