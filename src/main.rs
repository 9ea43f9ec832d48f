mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use restofeed::DataService;
use restofeed::config::Config;
use tracing_subscriber::EnvFilter;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let service = DataService::from_config(&config)?;

    match cli.command {
        Commands::Listing => commands::listing(&service).await?,
        Commands::Image(args) => commands::image(&service, args).await?,
        Commands::Thumbnails(args) => commands::thumbnails(&service, args).await?,
    }

    Ok(())
}
