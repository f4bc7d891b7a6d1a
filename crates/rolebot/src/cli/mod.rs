//! CLI command handling.

mod commands;
mod run;

pub use commands::{Cli, Commands};
pub use run::{migrate, run_bot};
