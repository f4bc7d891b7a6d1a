//! Discord-specific error types.
//!
//! Serenity failures are classified by HTTP status so the engine can tell
//! a missing member from a permission problem or a rate limit.

use derive_getters::Getters;
use rolebot_error::{EngineError, EngineErrorKind, RolebotErrorKind};

/// Discord error variants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum DiscordErrorKind {
    /// Guild, channel, message, member or role does not exist.
    #[display("Not found: {_0}")]
    NotFound(String),

    /// Bot lacks required permissions or its role ranks too low.
    #[display("Insufficient permissions: {_0}")]
    InsufficientPermissions(String),

    /// Discord rejected the request for rate limiting.
    #[display("Rate limited: {_0}")]
    RateLimited(String),

    /// Request failed in transit or with a server error.
    #[display("Request failed: {_0}")]
    RequestFailed(String),

    /// Serenity failure unrelated to an HTTP response.
    #[display("Serenity API error: {_0}")]
    SerenityError(String),

    /// Connection to Discord gateway failed.
    #[display("Connection failed: {_0}")]
    ConnectionFailed(String),

    /// Message failed to send.
    #[display("Message send failed: {_0}")]
    MessageSendFailed(String),
}

impl DiscordErrorKind {
    /// Classify an unsuccessful HTTP response.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            403 => Self::InsufficientPermissions(message),
            404 => Self::NotFound(message),
            429 => Self::RateLimited(message),
            _ => Self::RequestFailed(format!("HTTP {status}: {message}")),
        }
    }
}

/// Discord error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error, Getters)]
#[display("Discord Error: {} at line {} in {}", kind, line, file)]
pub struct DiscordError {
    kind: DiscordErrorKind,
    line: u32,
    file: &'static str,
}

impl DiscordError {
    /// Create a new DiscordError with automatic location tracking.
    ///
    /// # Example
    /// ```
    /// use rolebot_social::{DiscordError, DiscordErrorKind};
    ///
    /// let err = DiscordError::new(DiscordErrorKind::NotFound("member".into()));
    /// assert!(err.to_string().contains("Not found"));
    /// ```
    #[track_caller]
    pub fn new(kind: DiscordErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Result type for Discord operations.
pub type DiscordResult<T> = Result<T, DiscordError>;

impl From<serenity::Error> for DiscordError {
    #[track_caller]
    fn from(err: serenity::Error) -> Self {
        use serenity::http::HttpError;

        let kind = match &err {
            serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
                DiscordErrorKind::from_status(
                    response.status_code.as_u16(),
                    response.error.message.clone(),
                )
            }
            serenity::Error::Http(_) => DiscordErrorKind::RequestFailed(err.to_string()),
            _ => DiscordErrorKind::SerenityError(err.to_string()),
        };
        DiscordError::new(kind)
    }
}

impl From<DiscordError> for EngineError {
    #[track_caller]
    fn from(err: DiscordError) -> Self {
        let message = err.to_string();
        let kind = match err.kind {
            DiscordErrorKind::NotFound(_) => EngineErrorKind::NotFound(message),
            DiscordErrorKind::InsufficientPermissions(_) => {
                EngineErrorKind::PermissionDenied(message)
            }
            DiscordErrorKind::RateLimited(_) => EngineErrorKind::RateLimited(message),
            DiscordErrorKind::RequestFailed(_)
            | DiscordErrorKind::SerenityError(_)
            | DiscordErrorKind::ConnectionFailed(_)
            | DiscordErrorKind::MessageSendFailed(_) => EngineErrorKind::TransientNetwork(message),
        };
        EngineError::new(kind)
    }
}

impl From<DiscordError> for RolebotErrorKind {
    fn from(err: DiscordError) -> Self {
        RolebotErrorKind::Platform(err.to_string())
    }
}
