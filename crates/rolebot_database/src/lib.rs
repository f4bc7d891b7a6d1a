//! PostgreSQL persistence for Rolebot.
//!
//! This crate owns the relational schema for folders, folder role bindings,
//! react messages and join roles, and implements
//! [`rolebot_interface::ReactRoleStore`] on top of it.
//!
//! # Example
//!
//! ```rust,ignore
//! use rolebot_database::{PgReactRoleStore, establish_pool, run_migrations};
//!
//! let pool = establish_pool(&std::env::var("DATABASE_URL")?)?;
//! run_migrations(&pool)?;
//! let store = PgReactRoleStore::new(pool);
//! ```

mod connection;
mod models;
mod repository;

pub mod schema;

pub use connection::{DbPool, database_url_from_env, establish_pool, run_migrations};
pub use models::{
    FolderRow, JoinRoleRow, NewFolder, NewJoinRole, NewReactMessage, NewReactRole,
    ReactMessageRow, ReactRoleRow,
};
pub use repository::PgReactRoleStore;

use rolebot_error::DatabaseError;

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
