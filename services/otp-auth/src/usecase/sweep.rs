use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::domain::ports::{NetworkAuthorizer, Notifier};
use crate::usecase::CredentialCore;

/// Records removed by one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub otps_removed: usize,
    pub sessions_removed: usize,
}

impl<N, A> CredentialCore<N, A>
where
    N: Notifier,
    A: NetworkAuthorizer,
{
    /// Remove expired OTPs and sessions. Each store is swept under its own lock.
    pub fn sweep(&self) -> SweepReport {
        let now = self.now();
        SweepReport {
            otps_removed: self.sweep_otps(now),
            sessions_removed: self.sweep_sessions(now),
        }
    }

    pub(crate) fn sweep_otps(&self, now: DateTime<Utc>) -> usize {
        let removed = self.otps.sweep_expired(now);
        if removed > 0 {
            debug!(removed, "swept expired otps");
        }
        removed
    }

    pub(crate) fn sweep_sessions(&self, now: DateTime<Utc>) -> usize {
        let removed = self.sessions.sweep_expired(now);
        if removed > 0 {
            debug!(removed, "swept expired sessions");
        }
        removed
    }
}

/// Sweep on a fixed period in the background. Inline sweeps still run on every request;
/// this only bounds memory when the service is idle.
pub fn spawn_sweeper<N, A>(core: Arc<CredentialCore<N, A>>, period: Duration) -> JoinHandle<()>
where
    N: Notifier + 'static,
    A: NetworkAuthorizer + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            core.sweep();
        }
    })
}
