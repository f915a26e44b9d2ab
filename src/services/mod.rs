pub mod access_broker;
pub mod credential_authority;
pub mod media_origin;
pub mod registrar;

pub use access_broker::{ContentAccessBroker, GrantHandle};
pub use credential_authority::{CredentialAuthority, HttpCredentialAuthority, IssuedCredential};
pub use media_origin::classify;
pub use registrar::SessionRegistrar;
