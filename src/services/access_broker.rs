//! Time-limited access credentials for protected learning media.
//!
//! [`ContentAccessBroker::resolve`] turns one content reference into a
//! [`GrantHandle`]: third-party-hosted media passes through untouched, while
//! platform-hosted media gets a signed URL from the credential-issuing
//! authority and a silent renewal scheduled a fixed margin before expiry.
//! Dropping the handle cancels the renewal timer deterministically; a stale
//! timer must never fire against a grant nobody is watching.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::models::access_grant::{AccessGrant, ContentKind, GrantState, OriginKind};
use crate::services::credential_authority::CredentialAuthority;
use crate::services::media_origin::classify;
use crate::types::{ContentId, UserId};

pub struct ContentAccessBroker {
    authority: Arc<dyn CredentialAuthority>,
    user_id: UserId,
    renewal_margin: ChronoDuration,
}

impl ContentAccessBroker {
    pub fn new(authority: Arc<dyn CredentialAuthority>, user_id: UserId, config: &Config) -> Self {
        Self {
            authority,
            user_id,
            renewal_margin: config.renewal_margin(),
        }
    }

    /// Resolves one content item into an observable grant.
    ///
    /// The first resolution completes before this returns; renewals and
    /// refetches then update the handle's watch channel in place, so an
    /// already-playing credential is never blanked back to loading.
    pub async fn resolve(
        &self,
        content_id: ContentId,
        original_url: &str,
        content_kind: ContentKind,
    ) -> GrantHandle {
        let (state_tx, _) = watch::channel(GrantState::loading());
        let ctx = Arc::new(GrantContext {
            authority: Arc::clone(&self.authority),
            user_id: self.user_id,
            content_id,
            content_kind,
            original_url: original_url.to_string(),
            renewal_margin: self.renewal_margin,
            state_tx,
            renewal: Mutex::new(None),
        });
        resolve_once(&ctx).await;
        GrantHandle { inner: ctx }
    }
}

/// Everything one resolved content item needs to re-resolve itself.
struct GrantContext {
    authority: Arc<dyn CredentialAuthority>,
    user_id: UserId,
    content_id: ContentId,
    content_kind: ContentKind,
    original_url: String,
    renewal_margin: ChronoDuration,
    state_tx: watch::Sender<GrantState>,
    renewal: Mutex<Option<JoinHandle<()>>>,
}

impl GrantContext {
    fn cancel_renewal(&self) {
        if let Ok(mut slot) = self.renewal.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }

    /// Grant wrapping the original URL, used both for external pass-through
    /// and for the degraded fallback when the authority fails.
    fn direct_grant(&self, origin_kind: OriginKind) -> AccessGrant {
        AccessGrant {
            content_id: self.content_id,
            content_kind: self.content_kind,
            origin_kind,
            credential: self.original_url.clone(),
            issued_at: Utc::now(),
            expires_at: None,
        }
    }
}

/// Owner handle for one resolved content item.
///
/// Keep it alive while the content is being consumed; dropping it (or calling
/// [`teardown`](Self::teardown)) cancels any scheduled renewal. Replacing the
/// content a view shows means dropping the old handle and resolving a new one.
pub struct GrantHandle {
    inner: Arc<GrantContext>,
}

impl GrantHandle {
    /// Snapshot of the current grant state.
    pub fn state(&self) -> GrantState {
        self.inner.state_tx.borrow().clone()
    }

    /// Observe state transitions: the initial resolution, silent renewals,
    /// and manual refetches all publish here.
    pub fn subscribe(&self) -> watch::Receiver<GrantState> {
        self.inner.state_tx.subscribe()
    }

    /// Re-runs resolution immediately, replacing any scheduled renewal.
    /// Useful after a degraded fallback once the caller believes the
    /// authority has recovered.
    pub async fn refetch(&self) {
        self.inner.cancel_renewal();
        resolve_once(&self.inner).await;
    }

    /// Cancels the renewal timer. Also happens on drop.
    pub fn teardown(&self) {
        self.inner.cancel_renewal();
    }
}

impl Drop for GrantHandle {
    fn drop(&mut self) {
        self.inner.cancel_renewal();
    }
}

/// One full resolution pass. Reused verbatim by renewals and refetches.
async fn resolve_once(ctx: &Arc<GrantContext>) {
    if classify(&ctx.original_url) == OriginKind::External {
        // Provider-hosted media enforces its own access rules; nothing to
        // sign and nothing to renew.
        ctx.state_tx
            .send_replace(GrantState::ready(ctx.direct_grant(OriginKind::External)));
        return;
    }

    match ctx
        .authority
        .issue_access_credential(ctx.content_id, ctx.content_kind, ctx.user_id)
        .await
    {
        Ok(credential) => {
            let grant = AccessGrant {
                content_id: ctx.content_id,
                content_kind: ctx.content_kind,
                origin_kind: OriginKind::Internal,
                credential: credential.url,
                issued_at: Utc::now(),
                expires_at: Some(credential.expires_at),
            };
            ctx.state_tx.send_replace(GrantState::ready(grant));
            schedule_renewal(ctx, credential.expires_at);
        }
        Err(error) => {
            tracing::warn!(
                error = %error,
                content_id = %ctx.content_id,
                terminal = !error.is_transient(),
                "credential issuance failed; falling back to original URL"
            );
            // Availability over strictness: the authority's backing store
            // still enforces object-level permissions. No renewal timer in
            // either case; a denial must not be silently retried, and a
            // degraded grant has no expiry to renew against.
            ctx.state_tx.send_replace(GrantState::degraded(
                ctx.direct_grant(OriginKind::Internal),
                error,
            ));
        }
    }
}

/// Schedules a silent re-resolution at `expires_at - margin`. The task holds
/// only a weak reference, so a dropped handle ends it even mid-sleep.
fn schedule_renewal(ctx: &Arc<GrantContext>, expires_at: DateTime<Utc>) {
    let fire_at = expires_at - ctx.renewal_margin;
    let delay = (fire_at - Utc::now())
        .to_std()
        .unwrap_or(std::time::Duration::ZERO);
    let weak = Arc::downgrade(ctx);
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let Some(ctx) = weak.upgrade() else {
            return;
        };
        // This task is past its sleep; clear the slot without aborting
        // ourselves before resolving again.
        if let Ok(mut slot) = ctx.renewal.lock() {
            slot.take();
        }
        tracing::debug!(content_id = %ctx.content_id, "renewing media access credential");
        resolve_once(&ctx).await;
    });
    if let Ok(mut slot) = ctx.renewal.lock() {
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }
}
