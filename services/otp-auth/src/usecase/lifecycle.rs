use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::domain::ports::{Clock, EntropySource, NetworkAuthorizer, Notifier};
use crate::domain::types::{
    DEFAULT_OTP_LENGTH, DEFAULT_OTP_VALIDITY_SECS, DEFAULT_SESSION_DURATION_SECS,
};
use crate::infra::clock::SystemClock;
use crate::infra::entropy::OsEntropy;
use crate::store::{OtpStore, SessionStore};

/// Lifecycle knobs, already validated by configuration.
#[derive(Debug, Clone)]
pub struct CoreSettings {
    pub otp_length: usize,
    pub otp_validity_secs: u64,
    pub session_duration_secs: u64,
    /// When false the notifier is a simulation and its outcome is ignored.
    pub notifier_enabled: bool,
    /// Upper bound on each notifier/authorizer call.
    pub collaborator_timeout: StdDuration,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            otp_length: DEFAULT_OTP_LENGTH,
            otp_validity_secs: DEFAULT_OTP_VALIDITY_SECS,
            session_duration_secs: DEFAULT_SESSION_DURATION_SECS,
            notifier_enabled: false,
            collaborator_timeout: StdDuration::from_secs(5),
        }
    }
}

fn secs(value: u64) -> Duration {
    i64::try_from(value)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

/// Owns both stores and the injected collaborators. Build once at startup and share
/// behind an `Arc`.
pub struct CredentialCore<N, A> {
    pub(crate) otps: OtpStore,
    pub(crate) sessions: SessionStore,
    pub(crate) notifier: N,
    pub(crate) authorizer: A,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) settings: CoreSettings,
}

impl<N, A> CredentialCore<N, A>
where
    N: Notifier,
    A: NetworkAuthorizer,
{
    pub fn new(settings: CoreSettings, notifier: N, authorizer: A) -> Self {
        Self::with_sources(
            settings,
            notifier,
            authorizer,
            Arc::new(SystemClock),
            Arc::new(OsEntropy),
        )
    }

    pub fn with_sources(
        settings: CoreSettings,
        notifier: N,
        authorizer: A,
        clock: Arc<dyn Clock>,
        entropy: Arc<dyn EntropySource>,
    ) -> Self {
        let otps = OtpStore::new(
            Arc::clone(&entropy),
            settings.otp_length,
            secs(settings.otp_validity_secs),
        );
        let sessions = SessionStore::new(entropy, secs(settings.session_duration_secs));
        Self {
            otps,
            sessions,
            notifier,
            authorizer,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &CoreSettings {
        &self.settings
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Await a collaborator call, treating a timeout as failure.
    pub(crate) async fn bounded<F>(&self, what: &'static str, call: F) -> bool
    where
        F: Future<Output = bool>,
    {
        match tokio::time::timeout(self.settings.collaborator_timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    collaborator = what,
                    timeout_ms = self.settings.collaborator_timeout.as_millis() as u64,
                    "collaborator call timed out"
                );
                false
            }
        }
    }
}
