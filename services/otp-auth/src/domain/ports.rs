use std::future::Future;

use chrono::{DateTime, Utc};

/// Failure to obtain secure randomness for codes or tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntropyError {
    #[error("secure random source failed: {0}")]
    Source(String),
    #[error("no free code found after {attempts} draws")]
    Exhausted { attempts: usize },
}

/// Delivers an OTP out of band (email in production).
///
/// Returns `true` when the transport accepted the message. Implementations must not
/// retry on their own behalf beyond what their transport does; the core bounds the
/// call with a timeout and treats a timeout as `false`.
pub trait Notifier: Send + Sync {
    fn deliver(&self, address: &str, code: &str) -> impl Future<Output = bool> + Send;
}

/// Grants network access to an authenticated device (the captive-portal router).
///
/// The outcome is advisory: a `false` never revokes a session.
pub trait NetworkAuthorizer: Send + Sync {
    fn grant(
        &self,
        device_id: &str,
        caller_address: Option<&str>,
    ) -> impl Future<Output = bool> + Send;
}

/// Wall-clock source, swapped for a manual clock in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Cryptographically secure byte source.
pub trait EntropySource: Send + Sync {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError>;
}
