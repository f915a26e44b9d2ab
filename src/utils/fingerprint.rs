//! Coarse device fingerprinting.

use sha2::{Digest, Sha256};

/// Read-only snapshot of the client characteristics that feed the
/// fingerprint. Captured once at login and held for the session's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientEnvironment {
    pub user_agent: String,
    pub locale: String,
    pub screen_width: u32,
    pub screen_height: u32,
    /// Minutes offset from UTC as reported by the client clock.
    pub timezone_offset_minutes: i32,
}

/// Digest of stable client characteristics.
///
/// Deterministic for a fixed environment; materially different
/// devices/browsers produce different values. Collisions are acceptable.
/// This is a similarity signal for user-facing warnings, not a security
/// boundary.
pub fn fingerprint(env: &ClientEnvironment) -> String {
    let mut hasher = Sha256::new();
    hasher.update(env.user_agent.as_bytes());
    hasher.update([0u8]);
    hasher.update(env.locale.as_bytes());
    hasher.update([0u8]);
    hasher.update(env.screen_width.to_le_bytes());
    hasher.update(env.screen_height.to_le_bytes());
    hasher.update(env.timezone_offset_minutes.to_le_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}
