//! Diesel models for reaction-role tables.

use crate::schema::{folders, join_roles, react_messages, react_roles};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use rolebot_core::{
    ChannelId, EmojiKey, FolderId, FolderSummary, GuildId, JoinRole, MessageBinding, MessageId,
    ReactMessage, RoleBinding, RoleId,
};

/// Database row for the folders table.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = folders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FolderRow {
    pub id: i32,
    pub guild_id: i64,
    pub label: String,
    pub created_at: NaiveDateTime,
}

impl From<FolderRow> for FolderSummary {
    fn from(row: FolderRow) -> Self {
        FolderSummary {
            id: FolderId::new(row.id),
            label: row.label,
        }
    }
}

/// Insertable struct for the folders table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = folders)]
pub struct NewFolder<'a> {
    pub guild_id: i64,
    pub label: &'a str,
}

/// Database row for the react_roles table (folder contents).
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Associations)]
#[diesel(belongs_to(FolderRow, foreign_key = folder_id))]
#[diesel(table_name = react_roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReactRoleRow {
    pub id: i32,
    pub guild_id: i64,
    pub folder_id: i32,
    pub role_id: i64,
    pub role_name: String,
    pub emoji_id: String,
    pub created_at: NaiveDateTime,
}

impl From<ReactRoleRow> for RoleBinding {
    fn from(row: ReactRoleRow) -> Self {
        RoleBinding::new(
            RoleId::from_db(row.role_id),
            row.role_name,
            EmojiKey::from_stored(&row.emoji_id),
        )
    }
}

/// Insertable struct for the react_roles table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = react_roles)]
pub struct NewReactRole {
    pub guild_id: i64,
    pub folder_id: i32,
    pub role_id: i64,
    pub role_name: String,
    pub emoji_id: String,
}

impl NewReactRole {
    /// Row for `binding` inside `folder_id`.
    pub fn new(guild_id: GuildId, folder_id: FolderId, binding: &RoleBinding) -> Self {
        Self {
            guild_id: guild_id.to_db(),
            folder_id: folder_id.get(),
            role_id: binding.role_id().to_db(),
            role_name: binding.role_name().clone(),
            emoji_id: binding.emoji().to_string(),
        }
    }
}

/// Database row for the react_messages table.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = react_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReactMessageRow {
    pub id: i32,
    pub guild_id: i64,
    pub channel_id: i64,
    pub message_id: i64,
    pub role_id: i64,
    pub role_name: String,
    pub emoji_id: String,
    pub created_at: NaiveDateTime,
}

impl From<ReactMessageRow> for MessageBinding {
    fn from(row: ReactMessageRow) -> Self {
        MessageBinding {
            message: ReactMessage {
                guild_id: GuildId::from_db(row.guild_id),
                channel_id: ChannelId::from_db(row.channel_id),
                message_id: MessageId::from_db(row.message_id),
            },
            binding: RoleBinding::new(
                RoleId::from_db(row.role_id),
                row.role_name,
                EmojiKey::from_stored(&row.emoji_id),
            ),
        }
    }
}

/// Insertable struct for the react_messages table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = react_messages)]
pub struct NewReactMessage {
    pub guild_id: i64,
    pub channel_id: i64,
    pub message_id: i64,
    pub role_id: i64,
    pub role_name: String,
    pub emoji_id: String,
}

impl From<&MessageBinding> for NewReactMessage {
    fn from(entry: &MessageBinding) -> Self {
        Self {
            guild_id: entry.message.guild_id.to_db(),
            channel_id: entry.message.channel_id.to_db(),
            message_id: entry.message.message_id.to_db(),
            role_id: entry.binding.role_id().to_db(),
            role_name: entry.binding.role_name().clone(),
            emoji_id: entry.binding.emoji().to_string(),
        }
    }
}

/// Database row for the join_roles table.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = join_roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JoinRoleRow {
    pub id: i32,
    pub guild_id: i64,
    pub role_id: i64,
    pub created_at: NaiveDateTime,
}

impl From<JoinRoleRow> for JoinRole {
    fn from(row: JoinRoleRow) -> Self {
        JoinRole {
            role_id: RoleId::from_db(row.role_id),
        }
    }
}

/// Insertable struct for the join_roles table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = join_roles)]
pub struct NewJoinRole {
    pub guild_id: i64,
    pub role_id: i64,
}
