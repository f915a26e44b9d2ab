//! In-memory collaborators for component tests.
//!
//! These fakes stand in for the backend data service and the
//! credential-issuing authority, and count calls so tests can assert that
//! teardown really stops all attributable network activity.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};

use mentorly_session_core::error::{AccessError, SessionError};
use mentorly_session_core::models::{ConcurrentSession, SessionRecord};
use mentorly_session_core::repositories::SessionStore;
use mentorly_session_core::services::credential_authority::{
    CredentialAuthority, IssuedCredential,
};
use mentorly_session_core::types::{ContentId, SessionToken, UserId};
use mentorly_session_core::ContentKind;

/// Routes component logs through the test writer. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
pub struct InMemorySessionStore {
    rows: Mutex<HashMap<SessionToken, SessionRecord>>,
    pub upserts: AtomicUsize,
    pub deactivations: AtomicUsize,
    failing: AtomicBool,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn row(&self, token: SessionToken) -> Option<SessionRecord> {
        self.rows.lock().unwrap().get(&token).cloned()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    /// Shifts every row's `last_active_at` into the past, simulating the
    /// passage of wall-clock time between heartbeats.
    pub fn age_all(&self, by: ChronoDuration) {
        let mut rows = self.rows.lock().unwrap();
        for record in rows.values_mut() {
            record.last_active_at -= by;
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn upsert_session(&self, record: &SessionRecord) -> Result<(), SessionError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SessionError::Unavailable("store offline".into()));
        }
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.rows
            .lock()
            .unwrap()
            .insert(record.session_token, record.clone());
        Ok(())
    }

    async fn list_active_sessions(
        &self,
        user_id: UserId,
        excluding: SessionToken,
    ) -> Result<Vec<ConcurrentSession>, SessionError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SessionError::Unavailable("store offline".into()));
        }
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|r| r.user_id == user_id && r.is_active && r.session_token != excluding)
            .map(|r| ConcurrentSession {
                device_fingerprint: r.device_fingerprint.clone(),
                last_active_at: r.last_active_at,
            })
            .collect())
    }

    async fn set_session_inactive(
        &self,
        session_token: SessionToken,
        user_id: UserId,
    ) -> Result<(), SessionError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SessionError::Unavailable("store offline".into()));
        }
        self.deactivations.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        if let Some(record) = rows.get_mut(&session_token) {
            if record.user_id == user_id {
                record.is_active = false;
            }
        }
        Ok(())
    }
}

/// What the fake authority should answer with.
pub enum AuthorityMode {
    Issue,
    Unavailable,
    Denied,
}

pub struct RecordingAuthority {
    pub calls: AtomicUsize,
    ttl: ChronoDuration,
    mode: Mutex<AuthorityMode>,
    issued_expiries: Mutex<Vec<DateTime<Utc>>>,
}

impl RecordingAuthority {
    pub fn issuing(ttl: ChronoDuration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            ttl,
            mode: Mutex::new(AuthorityMode::Issue),
            issued_expiries: Mutex::new(Vec::new()),
        }
    }

    pub fn set_mode(&self, mode: AuthorityMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_issued_expiry(&self) -> Option<DateTime<Utc>> {
        self.issued_expiries.lock().unwrap().last().copied()
    }
}

#[async_trait]
impl CredentialAuthority for RecordingAuthority {
    async fn issue_access_credential(
        &self,
        content_id: ContentId,
        _content_kind: ContentKind,
        _caller: UserId,
    ) -> Result<IssuedCredential, AccessError> {
        let serial = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match *self.mode.lock().unwrap() {
            AuthorityMode::Issue => {
                let expires_at = Utc::now() + self.ttl;
                self.issued_expiries.lock().unwrap().push(expires_at);
                Ok(IssuedCredential {
                    url: format!(
                        "https://storage.mentorly.app/signed/{content_id}?serial={serial}"
                    ),
                    expires_at,
                })
            }
            AuthorityMode::Unavailable => {
                Err(AccessError::Unavailable("authority offline".into()))
            }
            AuthorityMode::Denied => Err(AccessError::Denied("not enrolled".into())),
        }
    }
}
