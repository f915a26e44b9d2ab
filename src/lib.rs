//! Session integrity and time-limited content access for the Mentorly
//! learning platform.
//!
//! Two independent components share the same user/device identity concept:
//!
//! - [`SessionRegistrar`] keeps one heartbeat-refreshed liveness record per
//!   browsing session and raises an advisory [`SecurityFlag`] when a second,
//!   materially different device becomes active for the same user within a
//!   short recency window.
//! - [`ContentAccessBroker`] converts a content reference into a short-lived
//!   access credential for platform-hosted media, passes third-party-hosted
//!   media through untouched, and silently renews credentials before expiry.
//!
//! The components never call each other; they are composed only by sharing a
//! [`types::UserId`] and the backend collaborators defined in
//! [`repositories`] and [`services::credential_authority`].

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;
pub mod types;
pub mod utils;

pub use config::Config;
pub use error::{AccessError, SessionError};
pub use models::access_grant::{AccessGrant, ContentKind, GrantState, OriginKind};
pub use models::session_record::{ConcurrentSession, SecurityFlag, SessionRecord};
pub use services::access_broker::{ContentAccessBroker, GrantHandle};
pub use services::registrar::SessionRegistrar;
