//! Engine timing configuration.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delays that shape reconciliation.
///
/// Both delays are durations from an event, never wall-clock deadlines.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct EngineTiming {
    /// How long a reaction waits before its role mutation (milliseconds)
    #[serde(default = "default_settle_delay_ms")]
    #[builder(default = "default_settle_delay_ms()")]
    settle_delay_ms: u64,

    /// How long join roles survive after a reaction grant (milliseconds)
    #[serde(default = "default_join_role_grace_ms")]
    #[builder(default = "default_join_role_grace_ms()")]
    join_role_grace_ms: u64,
}

fn default_settle_delay_ms() -> u64 {
    1500
}

fn default_join_role_grace_ms() -> u64 {
    5000
}

impl Default for EngineTiming {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            join_role_grace_ms: default_join_role_grace_ms(),
        }
    }
}

impl EngineTiming {
    /// Settling delay applied to every accepted reaction.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Grace period before join roles are revoked.
    pub fn join_role_grace(&self) -> Duration {
        Duration::from_millis(self.join_role_grace_ms)
    }
}
