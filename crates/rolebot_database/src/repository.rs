//! PostgreSQL repository for reaction-role configuration.

use crate::models::{
    FolderRow, JoinRoleRow, NewFolder, NewJoinRole, NewReactMessage, NewReactRole,
    ReactMessageRow, ReactRoleRow,
};
use crate::schema::{folders, join_roles, react_messages, react_roles};
use crate::{DatabaseResult, DbPool};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use rolebot_core::{
    ChannelId, FolderId, FolderSummary, GuildId, JoinRole, MessageBinding, MessageId,
    ReactMessage, RoleBinding, RoleId,
};
use rolebot_error::{DatabaseError, DatabaseErrorKind, EngineResult};
use rolebot_interface::ReactRoleStore;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// PostgreSQL implementation of [`ReactRoleStore`].
///
/// Every method checks a connection out of the pool and runs one statement,
/// or one transaction where a delete spans tables, on tokio's blocking
/// thread pool so diesel never stalls an async worker.
///
/// # Example
/// ```no_run
/// use rolebot_database::{PgReactRoleStore, establish_pool};
///
/// let pool = establish_pool("postgres://localhost/rolebot").unwrap();
/// let store = PgReactRoleStore::new(pool);
/// ```
#[derive(Clone)]
pub struct PgReactRoleStore {
    pool: DbPool,
}

impl PgReactRoleStore {
    /// Create a new store over a connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Run a closure against a pooled connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> DatabaseResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> DatabaseResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(DatabaseError::from)?;
            f(&mut *conn)
        })
        .await
        .map_err(|e| {
            DatabaseError::new(DatabaseErrorKind::Connection(format!(
                "Blocking database task failed: {e}"
            )))
        })?
    }
}

#[async_trait]
impl ReactRoleStore for PgReactRoleStore {
    // ============================================================================
    // Reads
    // ============================================================================

    #[instrument(skip(self))]
    async fn configured_guilds(&self) -> EngineResult<Vec<GuildId>> {
        let guilds = self
            .with_conn(|conn| {
                let mut guilds = BTreeSet::new();
                guilds.extend(
                    folders::table
                        .select(folders::guild_id)
                        .distinct()
                        .load::<i64>(conn)
                        .map_err(DatabaseError::from)?,
                );
                guilds.extend(
                    join_roles::table
                        .select(join_roles::guild_id)
                        .distinct()
                        .load::<i64>(conn)
                        .map_err(DatabaseError::from)?,
                );
                guilds.extend(
                    react_messages::table
                        .select(react_messages::guild_id)
                        .distinct()
                        .load::<i64>(conn)
                        .map_err(DatabaseError::from)?,
                );
                Ok(guilds)
            })
            .await?;

        Ok(guilds.into_iter().map(GuildId::from_db).collect())
    }

    #[instrument(skip(self))]
    async fn react_messages(&self) -> EngineResult<Vec<ReactMessage>> {
        let rows: Vec<(i64, i64, i64)> = self
            .with_conn(|conn| {
                react_messages::table
                    .select((
                        react_messages::guild_id,
                        react_messages::channel_id,
                        react_messages::message_id,
                    ))
                    .distinct()
                    .load(conn)
                    .map_err(DatabaseError::from)
            })
            .await?;

        Ok(rows
            .into_iter()
            .map(|(guild_id, channel_id, message_id)| ReactMessage {
                guild_id: GuildId::from_db(guild_id),
                channel_id: ChannelId::from_db(channel_id),
                message_id: MessageId::from_db(message_id),
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn role_bindings_by_message(
        &self,
        message_id: MessageId,
    ) -> EngineResult<Vec<MessageBinding>> {
        let rows: Vec<ReactMessageRow> = self
            .with_conn(move |conn| {
                react_messages::table
                    .filter(react_messages::message_id.eq(message_id.to_db()))
                    .order(react_messages::id.asc())
                    .select(ReactMessageRow::as_select())
                    .load(conn)
                    .map_err(DatabaseError::from)
            })
            .await?;

        Ok(rows.into_iter().map(MessageBinding::from).collect())
    }

    #[instrument(skip(self))]
    async fn role_bindings_by_guild(
        &self,
        guild_id: GuildId,
    ) -> EngineResult<Vec<MessageBinding>> {
        let rows: Vec<ReactMessageRow> = self
            .with_conn(move |conn| {
                react_messages::table
                    .filter(react_messages::guild_id.eq(guild_id.to_db()))
                    .order(react_messages::id.asc())
                    .select(ReactMessageRow::as_select())
                    .load(conn)
                    .map_err(DatabaseError::from)
            })
            .await?;

        Ok(rows.into_iter().map(MessageBinding::from).collect())
    }

    #[instrument(skip(self))]
    async fn join_roles(&self, guild_id: GuildId) -> EngineResult<Vec<JoinRole>> {
        let rows: Vec<JoinRoleRow> = self
            .with_conn(move |conn| {
                join_roles::table
                    .filter(join_roles::guild_id.eq(guild_id.to_db()))
                    .order(join_roles::id.asc())
                    .select(JoinRoleRow::as_select())
                    .load(conn)
                    .map_err(DatabaseError::from)
            })
            .await?;

        Ok(rows.into_iter().map(JoinRole::from).collect())
    }

    #[instrument(skip(self))]
    async fn folders(&self, guild_id: GuildId) -> EngineResult<Vec<FolderSummary>> {
        let rows: Vec<FolderRow> = self
            .with_conn(move |conn| {
                folders::table
                    .filter(folders::guild_id.eq(guild_id.to_db()))
                    .order(folders::id.asc())
                    .select(FolderRow::as_select())
                    .load(conn)
                    .map_err(DatabaseError::from)
            })
            .await?;

        Ok(rows.into_iter().map(FolderSummary::from).collect())
    }

    #[instrument(skip(self))]
    async fn folder_contents(&self, folder_id: FolderId) -> EngineResult<Vec<RoleBinding>> {
        let rows: Vec<ReactRoleRow> = self
            .with_conn(move |conn| {
                react_roles::table
                    .filter(react_roles::folder_id.eq(folder_id.get()))
                    .order(react_roles::id.asc())
                    .select(ReactRoleRow::as_select())
                    .load(conn)
                    .map_err(DatabaseError::from)
            })
            .await?;

        Ok(rows.into_iter().map(RoleBinding::from).collect())
    }

    // ============================================================================
    // Writes
    // ============================================================================

    #[instrument(skip(self))]
    async fn create_folder(&self, guild_id: GuildId, label: &str) -> EngineResult<FolderSummary> {
        let label = label.to_owned();

        let row: FolderRow = self
            .with_conn(move |conn| {
                diesel::insert_into(folders::table)
                    .values(&NewFolder {
                        guild_id: guild_id.to_db(),
                        label: &label,
                    })
                    .returning(FolderRow::as_returning())
                    .get_result(conn)
                    .map_err(DatabaseError::from)
            })
            .await?;

        debug!(folder_id = row.id, "Created folder");
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete_folder(&self, folder_id: FolderId) -> EngineResult<()> {
        self.with_conn(move |conn| {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                diesel::delete(
                    react_roles::table.filter(react_roles::folder_id.eq(folder_id.get())),
                )
                .execute(conn)?;
                let deleted = diesel::delete(folders::table.find(folder_id.get())).execute(conn)?;
                if deleted == 0 {
                    return Err(diesel::result::Error::NotFound);
                }
                Ok(())
            })
            .map_err(DatabaseError::from)
        })
        .await?;

        Ok(())
    }

    #[instrument(skip(self, binding), fields(role_id = %binding.role_id()))]
    async fn add_react_role(
        &self,
        guild_id: GuildId,
        folder_id: FolderId,
        binding: &RoleBinding,
    ) -> EngineResult<()> {
        let row = NewReactRole::new(guild_id, folder_id, binding);

        self.with_conn(move |conn| {
            diesel::insert_into(react_roles::table)
                .values(&row)
                .execute(conn)
                .map_err(DatabaseError::from)
        })
        .await?;

        Ok(())
    }

    #[instrument(skip(self, entry), fields(message_id = %entry.message.message_id))]
    async fn add_react_message(&self, entry: &MessageBinding) -> EngineResult<()> {
        let row = NewReactMessage::from(entry);

        self.with_conn(move |conn| {
            diesel::insert_into(react_messages::table)
                .values(&row)
                .on_conflict((react_messages::message_id, react_messages::emoji_id))
                .do_nothing()
                .execute(conn)
                .map_err(DatabaseError::from)
        })
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn add_join_role(&self, guild_id: GuildId, role: JoinRole) -> EngineResult<()> {
        let row = NewJoinRole {
            guild_id: guild_id.to_db(),
            role_id: role.role_id.to_db(),
        };

        self.with_conn(move |conn| {
            diesel::insert_into(join_roles::table)
                .values(&row)
                .on_conflict((join_roles::guild_id, join_roles::role_id))
                .do_nothing()
                .execute(conn)
                .map_err(DatabaseError::from)
        })
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_join_role(&self, role_id: RoleId) -> EngineResult<()> {
        self.with_conn(move |conn| {
            diesel::delete(join_roles::table.filter(join_roles::role_id.eq(role_id.to_db())))
                .execute(conn)
                .map_err(DatabaseError::from)
        })
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_react_role_by_role_id(&self, role_id: RoleId) -> EngineResult<()> {
        self.with_conn(move |conn| {
            diesel::delete(react_roles::table.filter(react_roles::role_id.eq(role_id.to_db())))
                .execute(conn)
                .map_err(DatabaseError::from)
        })
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_react_message_by_role_id(&self, role_id: RoleId) -> EngineResult<()> {
        self.with_conn(move |conn| {
            diesel::delete(
                react_messages::table.filter(react_messages::role_id.eq(role_id.to_db())),
            )
            .execute(conn)
            .map_err(DatabaseError::from)
        })
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_all_react_roles_by_guild(&self, guild_id: GuildId) -> EngineResult<()> {
        let deleted = self
            .with_conn(move |conn| {
                diesel::delete(
                    react_roles::table.filter(react_roles::guild_id.eq(guild_id.to_db())),
                )
                .execute(conn)
                .map_err(DatabaseError::from)
            })
            .await?;

        debug!(deleted, "Deleted guild react roles");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_react_messages_by_guild(&self, guild_id: GuildId) -> EngineResult<()> {
        let deleted = self
            .with_conn(move |conn| {
                diesel::delete(
                    react_messages::table.filter(react_messages::guild_id.eq(guild_id.to_db())),
                )
                .execute(conn)
                .map_err(DatabaseError::from)
            })
            .await?;

        debug!(deleted, "Deleted guild react messages");
        Ok(())
    }
}
