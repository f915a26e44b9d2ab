use thiserror::Error;

/// Failure talking to the backend data service's session table.
///
/// Heartbeats treat every variant as transient: the error is logged at the
/// call site and the next scheduled tick retries.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store error: {0}")]
    Store(#[from] sqlx::Error),
    #[error("session backend unavailable: {0}")]
    Unavailable(String),
}

/// Why a content credential could not be issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The issuing authority refused the caller. Terminal for this content
    /// item; never silently retried.
    #[error("access denied: {0}")]
    Denied(String),
    /// The authority could not be reached or answered malformed. Playback
    /// falls back to the original URL and the next resolution may succeed.
    #[error("credential authority unavailable: {0}")]
    Unavailable(String),
}

impl AccessError {
    /// Whether a later resolution attempt could reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, AccessError::Unavailable(_))
    }
}
