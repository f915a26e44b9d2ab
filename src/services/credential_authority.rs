//! Client for the backend's credential-issuing authority.
//!
//! Authorization policy (enrollment/ownership/role checks) lives entirely on
//! the backend; this module treats it as opaque and only maps transport
//! results onto the crate's error taxonomy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::error::AccessError;
use crate::models::access_grant::ContentKind;
use crate::types::{ContentId, UserId};

/// Signed URL plus its expiry contract, as returned by the authority.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuedCredential {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialAuthority: Send + Sync {
    async fn issue_access_credential(
        &self,
        content_id: ContentId,
        content_kind: ContentKind,
        caller: UserId,
    ) -> Result<IssuedCredential, AccessError>;
}

/// HTTP implementation talking to the platform backend.
pub struct HttpCredentialAuthority {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCredentialAuthority {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CredentialAuthority for HttpCredentialAuthority {
    async fn issue_access_credential(
        &self,
        content_id: ContentId,
        content_kind: ContentKind,
        caller: UserId,
    ) -> Result<IssuedCredential, AccessError> {
        let response = self
            .client
            .post(format!("{}/media/credentials", self.base_url))
            .json(&json!({
                "content_id": content_id,
                "content_kind": content_kind,
                "user_id": caller,
            }))
            .send()
            .await
            .map_err(|e| AccessError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<IssuedCredential>()
                .await
                .map_err(|e| AccessError::Unavailable(e.to_string()));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "access denied".to_string());
            return Err(AccessError::Denied(message));
        }

        Err(AccessError::Unavailable(format!(
            "authority returned {status}"
        )))
    }
}
