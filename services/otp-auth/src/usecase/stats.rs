use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::ports::{NetworkAuthorizer, Notifier};
use crate::domain::types::{OtpRecord, OtpStatus, SessionRecord, TOKEN_PREFIX_LEN};
use crate::usecase::CredentialCore;

/// Aggregate counts. Derived from the stores, never authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub active_otps: usize,
    pub used_otps: usize,
    pub live_sessions: usize,
    /// Codes issued since start, including swept ones.
    pub total_otps_issued: u64,
    /// Codes currently held, whatever their status.
    pub tracked_otps: usize,
    pub notifier_enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OtpView {
    pub code: String,
    pub email: String,
    pub status: OtpStatus,
    #[serde(serialize_with = "portal_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    pub expires_in_secs: u64,
    pub claimed_by: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub device_id: String,
    pub email: String,
    /// Leading characters only; the full token never leaves the verify response.
    pub token_prefix: String,
    #[serde(serialize_with = "portal_core::serde::to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
    pub remaining_secs: u64,
    pub source_otp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub stats: Stats,
    pub otps: Vec<OtpView>,
    pub sessions: Vec<SessionView>,
}

impl<N, A> CredentialCore<N, A>
where
    N: Notifier,
    A: NetworkAuthorizer,
{
    pub fn stats(&self) -> Stats {
        let now = self.now();
        self.sweep_otps(now);
        self.sweep_sessions(now);
        let counts = self.otps.counts(now);
        Stats {
            active_otps: counts.active,
            used_otps: counts.used,
            live_sessions: self.sessions.live_count(now),
            total_otps_issued: counts.total_issued,
            tracked_otps: counts.tracked,
            notifier_enabled: self.settings.notifier_enabled,
        }
    }

    /// Read-only copy of the OTP store in issue order.
    pub fn otp_snapshot(&self) -> Vec<OtpRecord> {
        self.otps.snapshot()
    }

    /// Read-only copy of the session store in creation order.
    pub fn session_snapshot(&self) -> Vec<SessionRecord> {
        self.sessions.snapshot()
    }

    pub fn dashboard(&self) -> Dashboard {
        let stats = self.stats();
        let now = self.now();
        let validity = self.otps.validity();

        let otps = self
            .otp_snapshot()
            .into_iter()
            .map(|r| OtpView {
                status: r.status_at(now, validity),
                expires_in_secs: u64::try_from((r.expires_at(validity) - now).num_seconds())
                    .unwrap_or(0),
                code: r.code,
                email: r.address,
                created_at: r.created_at,
                claimed_by: r.claimed_by,
            })
            .collect();

        let sessions = self
            .session_snapshot()
            .into_iter()
            .map(|s| SessionView {
                remaining_secs: s.remaining_secs(now),
                token_prefix: s.token.chars().take(TOKEN_PREFIX_LEN).collect(),
                device_id: s.device_id,
                email: s.address,
                expires_at: s.expires_at,
                source_otp: s.source_otp,
            })
            .collect();

        Dashboard {
            stats,
            otps,
            sessions,
        }
    }
}
