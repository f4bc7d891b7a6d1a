//! Error types for Rolebot.
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use rolebot_error::{EngineError, EngineErrorKind, RolebotResult};
//!
//! fn lookup() -> RolebotResult<u64> {
//!     Err(EngineError::new(EngineErrorKind::NotFound("role 42".into())))?
//! }
//!
//! assert!(lookup().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
#[cfg(feature = "database")]
mod database;
mod engine;
mod error;

pub use config::ConfigError;
#[cfg(feature = "database")]
pub use database::{DatabaseError, DatabaseErrorKind};
pub use engine::{EngineError, EngineErrorKind, EngineResult};
pub use error::{RolebotError, RolebotErrorKind, RolebotResult};
