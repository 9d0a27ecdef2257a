//! Credential lifecycle core: the only component that writes the OTP and session stores.

pub mod check_auth;
pub mod lifecycle;
pub mod request_otp;
pub mod stats;
pub mod sweep;
pub mod verify_otp;

pub use self::lifecycle::{CoreSettings, CredentialCore};
