//! Session liveness heartbeats and concurrent-login detection.
//!
//! One registrar instance exists per logged-in browsing session. It owns a
//! per-session token generated once at construction, refreshes the backend's
//! view of "which devices are live for this user" on a fixed cadence, and
//! publishes advisory [`SecurityFlag`]s when another, materially different
//! device is active within the recency window.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::models::session_record::{ConcurrentSession, SecurityFlag, SessionRecord};
use crate::repositories::session_store::SessionStore;
use crate::types::{SessionToken, UserId};
use crate::utils::fingerprint::{fingerprint, ClientEnvironment};

pub struct SessionRegistrar {
    store: Arc<dyn SessionStore>,
    user_id: UserId,
    session_token: SessionToken,
    device_fingerprint: String,
    recency_window: ChronoDuration,
    heartbeat_interval: Duration,
    flag_tx: watch::Sender<Option<SecurityFlag>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionRegistrar {
    /// Builds a registrar for one freshly logged-in session. The session
    /// token is generated here and lives exactly as long as this instance;
    /// a fresh login always gets a new token.
    pub fn new(
        store: Arc<dyn SessionStore>,
        user_id: UserId,
        client_env: &ClientEnvironment,
        config: &Config,
    ) -> Arc<Self> {
        let (flag_tx, _) = watch::channel(None);
        Arc::new(Self {
            store,
            user_id,
            session_token: SessionToken::new(),
            device_fingerprint: fingerprint(client_env),
            recency_window: config.recency_window(),
            heartbeat_interval: config.heartbeat_interval(),
            flag_tx,
            task: Mutex::new(None),
        })
    }

    pub fn session_token(&self) -> SessionToken {
        self.session_token
    }

    pub fn device_fingerprint(&self) -> &str {
        &self.device_fingerprint
    }

    /// Latest advisory flag. Cleared back to `None` once concurrent use is
    /// no longer observed or the session deactivates.
    pub fn security_flags(&self) -> watch::Receiver<Option<SecurityFlag>> {
        self.flag_tx.subscribe()
    }

    /// One liveness round-trip: look for other live devices, then refresh
    /// this session's row (upsert keyed by the session token).
    ///
    /// Store failures are logged and swallowed; a heartbeat never propagates
    /// an error into the caller's path. On failure the previously published
    /// flag is left untouched and the next tick retries.
    pub async fn heartbeat(&self) -> Option<SecurityFlag> {
        match self.heartbeat_inner().await {
            Ok(flag) => {
                self.flag_tx.send_replace(flag.clone());
                flag
            }
            Err(err) => {
                tracing::warn!(
                    error = ?err,
                    user_id = %self.user_id,
                    session_token = %self.session_token,
                    "session heartbeat failed"
                );
                None
            }
        }
    }

    async fn heartbeat_inner(&self) -> Result<Option<SecurityFlag>, crate::error::SessionError> {
        let now = Utc::now();
        let others = self
            .store
            .list_active_sessions(self.user_id, self.session_token)
            .await?;

        let flag = detect_concurrent_use(&others, &self.device_fingerprint, now, self.recency_window);

        if let Some(flag) = &flag {
            tracing::info!(
                user_id = %self.user_id,
                devices = flag.concurrent_devices,
                "concurrent session from a different device detected"
            );
        }

        self.store
            .upsert_session(&SessionRecord {
                session_token: self.session_token,
                user_id: self.user_id,
                device_fingerprint: self.device_fingerprint.clone(),
                last_active_at: now,
                is_active: true,
            })
            .await?;

        Ok(flag)
    }

    /// Runs a heartbeat immediately, then at the configured cadence until
    /// [`deactivate`](Self::deactivate) is called or the registrar is
    /// dropped. The task holds only a weak reference, so dropping the last
    /// external handle ends it.
    pub fn start(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let interval = self.heartbeat_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(registrar) = weak.upgrade() else {
                    break;
                };
                registrar.heartbeat().await;
            }
        });
        if let Ok(mut slot) = self.task.lock() {
            if let Some(previous) = slot.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Marks this session inactive and stops the heartbeat task. Best-effort:
    /// a store failure is logged and never blocks logout. Terminal; a
    /// deactivated session is never reactivated.
    pub async fn deactivate(&self) {
        self.stop();
        if let Err(err) = self
            .store
            .set_session_inactive(self.session_token, self.user_id)
            .await
        {
            tracing::warn!(
                error = ?err,
                user_id = %self.user_id,
                session_token = %self.session_token,
                "failed to mark session inactive"
            );
        }
        self.flag_tx.send_replace(None);
    }

    fn stop(&self) {
        if let Ok(mut slot) = self.task.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for SessionRegistrar {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Flags other-device sessions still live inside the recency window.
///
/// A record exactly at `now - window` counts as stale; strictly newer counts
/// as live. Same-fingerprint sessions never flag (likely the same device in
/// another tab).
fn detect_concurrent_use(
    others: &[ConcurrentSession],
    own_fingerprint: &str,
    now: chrono::DateTime<Utc>,
    window: ChronoDuration,
) -> Option<SecurityFlag> {
    let cutoff = now - window;
    let concurrent: Vec<&ConcurrentSession> = others
        .iter()
        .filter(|s| s.device_fingerprint != own_fingerprint)
        .filter(|s| s.last_active_at > cutoff)
        .collect();

    concurrent
        .iter()
        .max_by_key(|s| s.last_active_at)
        .map(|newest| {
            let devices: HashSet<&str> = concurrent
                .iter()
                .map(|s| s.device_fingerprint.as_str())
                .collect();
            SecurityFlag {
                other_device_fingerprint: newest.device_fingerprint.clone(),
                other_last_active_at: newest.last_active_at,
                concurrent_devices: devices.len(),
            }
        })
}
