use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "restofeed")]
#[command(about = "Fetch the restaurant listing and its images", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $RESTOFEED_CONFIG or config/restofeed.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the listing and print one line per item
    Listing,
    /// Download a single image
    Image(ImageArgs),
    /// Download every item's thumbnail concurrently and report sizes
    Thumbnails(ThumbnailArgs),
}

#[derive(clap::Args, Debug)]
pub struct ImageArgs {
    /// Absolute image URL
    pub url: String,

    /// Write the bytes here instead of only reporting the size
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ThumbnailArgs {
    /// Only fetch the first N thumbnails
    #[arg(long)]
    pub limit: Option<usize>,
}
