//! Data models shared across persistence and the component services.

pub mod access_grant;
pub mod session_record;

pub use access_grant::*;
pub use session_record::*;
