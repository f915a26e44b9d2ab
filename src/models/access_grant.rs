//! Ephemeral access grants for protected learning media.
//!
//! Grants are computed per request and never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AccessError;
use crate::types::ContentId;

/// Kind of learning media being gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Video,
    Audio,
    File,
}

/// Where a piece of content is hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginKind {
    /// Platform storage; playback requires a broker-issued signed URL.
    Internal,
    /// Public third-party provider; the original URL is usable as-is.
    External,
}

/// Time-limited credential authorizing retrieval of one content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessGrant {
    pub content_id: ContentId,
    pub content_kind: ContentKind,
    pub origin_kind: OriginKind,
    /// Signed URL for internal content, the provider URL otherwise.
    pub credential: String,
    pub issued_at: DateTime<Utc>,
    /// None for external grants and degraded fallbacks; those carry no expiry
    /// enforced by this subsystem.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessGrant {
    pub fn is_external(&self) -> bool {
        self.origin_kind == OriginKind::External
    }
}

/// Observable state of one resolved content item, published on a watch
/// channel by the broker and updated in place on silent renewals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantState {
    /// Current grant, if resolution has produced one (possibly degraded).
    pub grant: Option<AccessGrant>,
    /// True only before the first resolution completes.
    pub is_loading: bool,
    /// Set when the last resolution fell back or was denied. A grant may
    /// still be present alongside the error (availability over strictness).
    pub error: Option<AccessError>,
}

impl GrantState {
    pub fn loading() -> Self {
        GrantState {
            grant: None,
            is_loading: true,
            error: None,
        }
    }

    pub fn ready(grant: AccessGrant) -> Self {
        GrantState {
            grant: Some(grant),
            is_loading: false,
            error: None,
        }
    }

    pub fn degraded(grant: AccessGrant, error: AccessError) -> Self {
        GrantState {
            grant: Some(grant),
            is_loading: false,
            error: Some(error),
        }
    }

    /// URL the player should use right now, if any.
    pub fn credential(&self) -> Option<&str> {
        self.grant.as_ref().map(|grant| grant.credential.as_str())
    }

    pub fn is_external(&self) -> bool {
        self.grant
            .as_ref()
            .map(AccessGrant::is_external)
            .unwrap_or(false)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.grant.as_ref().and_then(|grant| grant.expires_at)
    }
}
