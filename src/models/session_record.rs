//! Models for tracking active browsing sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{SessionToken, UserId};

/// Database representation of one browsing session's liveness.
///
/// At most one row exists per `session_token`; multiple rows may share a
/// `user_id`. Rows are soft-deleted on logout and retained for audit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRecord {
    /// Opaque identifier generated once per browser session.
    pub session_token: SessionToken,
    /// User owning the session.
    pub user_id: UserId,
    /// Coarse digest of client characteristics. A similarity signal, not an
    /// identity proof.
    pub device_fingerprint: String,
    /// Refreshed on every heartbeat.
    pub last_active_at: DateTime<Utc>,
    /// Cleared on explicit logout; never reset to true afterwards.
    pub is_active: bool,
}

/// Liveness signal for another active session of the same user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConcurrentSession {
    pub device_fingerprint: String,
    pub last_active_at: DateTime<Utc>,
}

/// Advisory warning that a different device became active for the same user
/// within the recency window. Informational only; nothing is locked out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityFlag {
    /// Fingerprint of the most recently active other device.
    pub other_device_fingerprint: String,
    /// When that device was last seen.
    pub other_last_active_at: DateTime<Utc>,
    /// Distinct other devices seen inside the recency window.
    pub concurrent_devices: usize,
}
