mod auth;
mod browser;
mod cli;
mod config;
mod credentials;
mod error;
mod git;
mod login;
mod output;
mod prompt;
mod providers;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::{info, LevelFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.debug {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    output::print_banner();

    info!("Starting devops - GitLab CLI");
    cli.execute().await?;

    Ok(())
}
