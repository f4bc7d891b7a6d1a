//! Operator-defined folders of role bindings.

use crate::{GuildId, RoleBinding};
use serde::{Deserialize, Serialize};

/// Persistence-assigned folder identifier.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct FolderId(i32);

impl FolderId {
    /// Wrap a raw id.
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// The raw id.
    pub const fn get(self) -> i32 {
        self.0
    }
}

/// Entry in a guild's ordered folder list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderSummary {
    /// Folder id
    pub id: FolderId,
    /// Operator-facing label
    pub label: String,
}

/// Folder contents, keyed by id in the cache.
///
/// # Examples
///
/// ```
/// use rolebot_core::{EmojiKey, Folder, FolderId, GuildId, RoleBinding, RoleId};
///
/// let mut folder = Folder::new(FolderId::new(1), "Games", GuildId::new(9));
/// folder.roles.push(RoleBinding::new(RoleId::new(2), "Gamer", EmojiKey::Custom(3)));
/// assert!(folder.binding_for(&EmojiKey::Custom(3)).is_some());
/// assert_eq!(folder.summary().label, "Games");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Folder id
    pub id: FolderId,
    /// Operator-facing label
    pub label: String,
    /// Owning guild
    pub guild_id: GuildId,
    /// Ordered role bindings
    pub roles: Vec<RoleBinding>,
}

impl Folder {
    /// Create an empty folder.
    pub fn new(id: FolderId, label: impl Into<String>, guild_id: GuildId) -> Self {
        Self {
            id,
            label: label.into(),
            guild_id,
            roles: Vec::new(),
        }
    }

    /// The list entry for this folder.
    pub fn summary(&self) -> FolderSummary {
        FolderSummary {
            id: self.id,
            label: self.label.clone(),
        }
    }

    /// Binding using `emoji`, if any.
    pub fn binding_for(&self, emoji: &crate::EmojiKey) -> Option<&RoleBinding> {
        self.roles.iter().find(|b| b.emoji() == emoji)
    }
}
