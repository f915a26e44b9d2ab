//! Persistence for session liveness records.
//!
//! The trait is the narrow interface the registrar needs from the backend
//! data service; `PgSessionStore` is the production implementation. Use
//! `MockSessionStore` (mockall) in tests.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::SessionError;
use crate::models::session_record::{ConcurrentSession, SessionRecord};
use crate::types::{SessionToken, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts or refreshes the row keyed by `record.session_token`.
    /// Idempotent: repeated calls for the same token keep one logical row,
    /// last write wins on `last_active_at`.
    async fn upsert_session(&self, record: &SessionRecord) -> Result<(), SessionError>;

    /// Other active sessions of the same user, excluding the caller's own
    /// token. Recency filtering happens in the registrar, not here.
    async fn list_active_sessions(
        &self,
        user_id: UserId,
        excluding: SessionToken,
    ) -> Result<Vec<ConcurrentSession>, SessionError>;

    /// Soft-deletes one session. The row is retained for audit.
    async fn set_session_inactive(
        &self,
        session_token: SessionToken,
        user_id: UserId,
    ) -> Result<(), SessionError>;
}

pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn upsert_session(&self, record: &SessionRecord) -> Result<(), SessionError> {
        sqlx::query(
            r#"
            INSERT INTO session_records
                (session_token, user_id, device_fingerprint, last_active_at, is_active)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (session_token) DO UPDATE
            SET device_fingerprint = EXCLUDED.device_fingerprint,
                last_active_at = EXCLUDED.last_active_at,
                is_active = EXCLUDED.is_active
            "#,
        )
        .bind(record.session_token)
        .bind(record.user_id)
        .bind(&record.device_fingerprint)
        .bind(record.last_active_at)
        .bind(record.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_active_sessions(
        &self,
        user_id: UserId,
        excluding: SessionToken,
    ) -> Result<Vec<ConcurrentSession>, SessionError> {
        let sessions = sqlx::query_as::<_, ConcurrentSession>(
            r#"
            SELECT device_fingerprint, last_active_at
            FROM session_records
            WHERE user_id = $1
              AND is_active = TRUE
              AND session_token <> $2
            ORDER BY last_active_at DESC
            "#,
        )
        .bind(user_id)
        .bind(excluding)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    async fn set_session_inactive(
        &self,
        session_token: SessionToken,
        user_id: UserId,
    ) -> Result<(), SessionError> {
        sqlx::query(
            r#"
            UPDATE session_records
            SET is_active = FALSE
            WHERE session_token = $1 AND user_id = $2
            "#,
        )
        .bind(session_token)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
