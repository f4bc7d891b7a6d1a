//! Reconciliation engine error types.
//!
//! Every per-event failure in the engine is one of these kinds. Handlers
//! catch them at their boundary, log them with guild context and move on.

/// Reconciliation error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum EngineErrorKind {
    /// Role, member, message, channel, folder or binding absent at lookup time.
    #[display("Not found: {}", _0)]
    NotFound(String),

    /// Remote mutation rejected by platform-side authorization.
    #[display("Permission denied: {}", _0)]
    PermissionDenied(String),

    /// Remote call rejected because the platform rate limit was hit.
    #[display("Rate limited: {}", _0)]
    RateLimited(String),

    /// Remote call failed in transit.
    #[display("Transient network error: {}", _0)]
    TransientNetwork(String),

    /// Durable store read or write failed.
    #[display("Persistence failure: {}", _0)]
    Persistence(String),

    /// A cached entity was invalidated between lookup and use.
    #[display("Stale cache conflict: {}", _0)]
    StaleCacheConflict(String),

    /// Two bindings on the same message or folder would share an emoji.
    #[display("Duplicate emoji: {}", _0)]
    DuplicateEmoji(String),

    /// Operator input could not be interpreted.
    #[display("Invalid input: {}", _0)]
    InvalidInput(String),
}

/// Engine error with source location tracking.
///
/// # Examples
///
/// ```
/// use rolebot_error::{EngineError, EngineErrorKind};
///
/// let err = EngineError::new(EngineErrorKind::RateLimited("add_role".into()));
/// assert!(err.is_retryable());
/// assert!(format!("{}", err).contains("Rate limited"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Engine Error: {} at line {} in {}", kind, line, file)]
pub struct EngineError {
    /// The kind of error that occurred
    pub kind: EngineErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl EngineError {
    /// Create a new EngineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: EngineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a [`EngineErrorKind::NotFound`] error.
    #[track_caller]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::NotFound(what.into()))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &EngineErrorKind {
        &self.kind
    }

    /// Whether a later attempt might succeed.
    ///
    /// The engine itself never retries; this only shapes log severity.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            EngineErrorKind::RateLimited(_) | EngineErrorKind::TransientNetwork(_)
        )
    }

    /// Whether this error means an entity disappeared.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind,
            EngineErrorKind::NotFound(_) | EngineErrorKind::StaleCacheConflict(_)
        )
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
