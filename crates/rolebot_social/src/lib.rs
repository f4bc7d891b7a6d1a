//! Discord adapter for Rolebot.
//!
//! Translates serenity gateway events into engine calls, implements the
//! engine's platform collaborators over the Discord REST API, and runs the
//! operator text commands that configure folders and join roles.

#![warn(missing_docs)]

mod client;
mod commands;
mod config;
mod conversions;
mod error;
mod handler;
mod platform;

pub use client::RolebotBot;
pub use commands::{
    CommandExecutor, OperatorCommand, USAGE, emoji_markdown, failure_text, render_folder,
    render_folder_list, render_join_roles,
};
pub use config::CommandConfig;
pub use conversions::{raw_reaction, reaction_type};
pub use error::{DiscordError, DiscordErrorKind, DiscordResult};
pub use handler::RolebotHandler;
pub use platform::{SerenityPlatform, highest_ranked};
