//! Rolebot binary.
//!
//! - `rolebot run` serves reaction roles until interrupted
//! - `rolebot migrate` applies database migrations

use clap::Parser;
use rolebot::{LoggingConfig, RolebotConfig, init_logging};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, migrate, run_bot};

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RolebotConfig::from_file(path)?,
        None => RolebotConfig::default(),
    };

    init_logging(&LoggingConfig::new(cli.verbose).with_json_logs(*config.log_json()))?;

    match cli.command {
        Commands::Run => run_bot(config).await?,
        Commands::Migrate => migrate()?,
    }

    Ok(())
}
