//! tally-crawler - Vote-tally extraction CLI for election-results sites
//!
//! A Rust implementation driving a real browser, since the source site
//! renders everything client-side.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tally_crawler::commands::{MunicipalityCommand, ProvinceCommand, Race};
use tally_crawler::config::{parse_headless, Config};
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tally-crawler",
    version,
    about = "Vote-tally extraction CLI for election-results sites",
    long_about = "Extracts the full municipality → city → school → ballot-table \
                  result tree from the provincial election-results site and writes \
                  it as one JSON document per run."
)]
struct Cli {
    /// Execute in headless mode (true/false/1/0/yes)
    #[arg(long, default_value = "true", global = true)]
    headless: String,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory the output document is written to
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get all votes for senators
    Senators,

    /// Get all votes for deputies
    Deputies,

    /// Get all votes for councilors
    Councilors,

    /// Get all votes for a specific municipality
    #[command(alias = "m")]
    Municipality {
        /// Municipality URL to process
        #[arg(long)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    config.headless = parse_headless(&cli.headless);
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    match cli.command {
        Commands::Senators => ProvinceCommand::new(Race::Senators).execute()?,
        Commands::Deputies => ProvinceCommand::new(Race::Deputies).execute()?,
        Commands::Councilors => ProvinceCommand::new(Race::Councilors).execute()?,

        Commands::Municipality { url } => {
            let cmd = MunicipalityCommand::new(config);
            let path = cmd.execute(&url).await?;
            println!("Results saved to {}", path.display());
        }
    }

    Ok(())
}
