//! Text command grammar.

use rolebot_core::{EmojiKey, RoleId};
use rolebot_error::{EngineError, EngineErrorKind, EngineResult};

/// Usage shown for `help` and for malformed commands.
pub const USAGE: &str = "\
folder create <label>
folder list
folder add <index> <role> <emoji>
folder publish <index>
folder remove -id <index>
joinrole add <role>
joinrole remove <role>
joinrole list
react nuke";

/// A parsed operator command.
///
/// Folder indices are positions in the guild's folder list, starting at 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Create an empty folder
    FolderCreate {
        /// Folder label
        label: String,
    },
    /// List folders with their positions
    FolderList,
    /// Bind a role to an emoji inside a folder
    FolderAdd {
        /// Folder position
        index: usize,
        /// Role to grant
        role_id: RoleId,
        /// Emoji that grants it
        emoji: EmojiKey,
    },
    /// Post a folder as a react message
    FolderPublish {
        /// Folder position
        index: usize,
    },
    /// Delete a folder
    FolderRemove {
        /// Folder position
        index: usize,
    },
    /// Add a join role
    JoinRoleAdd {
        /// Role granted on join
        role_id: RoleId,
    },
    /// Remove a join role
    JoinRoleRemove {
        /// Role no longer granted on join
        role_id: RoleId,
    },
    /// List join roles
    JoinRoleList,
    /// Delete every react message and react role of the guild
    ReactNuke,
    /// Show usage
    Help,
}

impl OperatorCommand {
    /// Parse a message.
    ///
    /// Returns `None` when the message does not start with `prefix`.
    pub fn parse(prefix: &str, content: &str) -> Option<EngineResult<Self>> {
        let body = content.trim().strip_prefix(prefix)?;
        let words: Vec<&str> = body.split_whitespace().collect();
        Some(Self::parse_words(&words))
    }

    fn parse_words(words: &[&str]) -> EngineResult<Self> {
        match words {
            [] | ["help"] => Ok(Self::Help),

            ["folder", "create", label @ ..] if !label.is_empty() => Ok(Self::FolderCreate {
                label: label.join(" "),
            }),
            ["folder", "list"] => Ok(Self::FolderList),
            ["folder", "add", index, role, emoji] => Ok(Self::FolderAdd {
                index: parse_index(index)?,
                role_id: parse_role(role)?,
                emoji: EmojiKey::parse_mention(emoji)
                    .ok_or_else(|| invalid(format!("`{emoji}` is not an emoji")))?,
            }),
            ["folder", "publish", index] => Ok(Self::FolderPublish {
                index: parse_index(index)?,
            }),
            ["folder", "remove", "-id", index] => Ok(Self::FolderRemove {
                index: parse_index(index)?,
            }),

            ["joinrole", "add", role] => Ok(Self::JoinRoleAdd {
                role_id: parse_role(role)?,
            }),
            ["joinrole", "remove", role] => Ok(Self::JoinRoleRemove {
                role_id: parse_role(role)?,
            }),
            ["joinrole", "list"] => Ok(Self::JoinRoleList),

            ["react", "nuke"] => Ok(Self::ReactNuke),

            _ => Err(invalid(format!("Unknown command. Usage:\n{USAGE}"))),
        }
    }
}

#[track_caller]
fn invalid(message: String) -> EngineError {
    EngineError::new(EngineErrorKind::InvalidInput(message))
}

fn parse_index(word: &str) -> EngineResult<usize> {
    word.parse()
        .map_err(|_| invalid(format!("`{word}` is not a folder index")))
}

/// A role mention (`<@&id>`) or a bare id.
fn parse_role(word: &str) -> EngineResult<RoleId> {
    let digits = word
        .strip_prefix("<@&")
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(word);
    digits
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(RoleId::new)
        .ok_or_else(|| invalid(format!("`{word}` is not a role")))
}
