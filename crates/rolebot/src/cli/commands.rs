//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Rolebot - Discord reaction roles with join-role handoff
#[derive(Parser, Debug)]
#[command(name = "rolebot")]
#[command(about = "Discord reaction roles with join-role handoff", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to Discord and serve reaction roles until interrupted
    Run,

    /// Apply pending database migrations and exit
    Migrate,
}
