//! Top-level error wrapper types.

use crate::{ConfigError, EngineError};
#[cfg(feature = "database")]
use crate::DatabaseError;

/// Every error a Rolebot process can surface.
///
/// # Examples
///
/// ```
/// use rolebot_error::{ConfigError, RolebotError};
///
/// let err: RolebotError = ConfigError::new("bad prefix").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum RolebotErrorKind {
    /// Reconciliation engine error
    #[from(EngineError)]
    Engine(EngineError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Database error
    #[cfg(feature = "database")]
    #[from(DatabaseError)]
    Database(DatabaseError),
    /// Gateway or platform error, already rendered by the platform crate
    #[display("Platform Error: {}", _0)]
    #[from(skip)]
    Platform(#[error(not(source))] String),
}

/// Rolebot error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Rolebot Error: {}", _0)]
pub struct RolebotError(Box<RolebotErrorKind>);

impl RolebotError {
    /// Create a new error from a kind.
    pub fn new(kind: RolebotErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Create a platform error from any displayable failure.
    pub fn platform(message: impl std::fmt::Display) -> Self {
        Self::new(RolebotErrorKind::Platform(message.to_string()))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RolebotErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to RolebotErrorKind
impl<T> From<T> for RolebotError
where
    T: Into<RolebotErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Rolebot operations.
pub type RolebotResult<T> = std::result::Result<T, RolebotError>;
