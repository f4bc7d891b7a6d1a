//! Operator command configuration.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How operators talk to the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct CommandConfig {
    /// Prefix that marks a message as a command
    #[serde(default = "default_command_prefix")]
    command_prefix: String,

    /// How long command replies stay up (seconds)
    #[serde(default = "default_feedback_ttl_secs")]
    feedback_ttl_secs: u64,
}

fn default_command_prefix() -> String {
    "rb!".to_string()
}

fn default_feedback_ttl_secs() -> u64 {
    10
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            feedback_ttl_secs: default_feedback_ttl_secs(),
        }
    }
}

impl CommandConfig {
    /// Lifetime of a reply before it is deleted.
    pub fn feedback_ttl(&self) -> Duration {
        Duration::from_secs(self.feedback_ttl_secs)
    }
}
