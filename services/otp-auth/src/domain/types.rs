use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::Serialize;

/// Default OTP length in decimal digits.
pub const DEFAULT_OTP_LENGTH: usize = 6;

/// Default OTP validity window in seconds.
pub const DEFAULT_OTP_VALIDITY_SECS: u64 = 300;

/// Default session duration in seconds.
pub const DEFAULT_SESSION_DURATION_SECS: u64 = 3600;

/// Bytes of entropy behind each session token (base64url encodes to 43 chars).
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Characters of a session token shown in dashboard views.
pub const TOKEN_PREFIX_LEN: usize = 16;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});

/// Trim and lower-case an address the way it is stored and compared.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Syntactic email check; no deliverability or DNS lookups.
pub fn validate_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Stored lifecycle state of an OTP. Expiry is derived from age, see [`OtpRecord::status_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpState {
    Active,
    Used,
}

/// Observable status of an OTP, including the derived `Expired` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OtpStatus {
    Active,
    Used,
    Expired,
}

/// One-time passcode issued to an email address.
#[derive(Debug, Clone)]
pub struct OtpRecord {
    pub code: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub state: OtpState,
    /// Device that consumed the code; only set on successful verification.
    pub claimed_by: Option<String>,
    /// Insertion sequence, keeps snapshots in issue order.
    pub(crate) seq: u64,
}

impl OtpRecord {
    /// Age strictly greater than the window counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>, validity: Duration) -> bool {
        now - self.created_at > validity
    }

    pub fn status_at(&self, now: DateTime<Utc>, validity: Duration) -> OtpStatus {
        match self.state {
            OtpState::Used => OtpStatus::Used,
            OtpState::Active if self.is_expired_at(now, validity) => OtpStatus::Expired,
            OtpState::Active => OtpStatus::Active,
        }
    }

    pub fn expires_at(&self, validity: Duration) -> DateTime<Utc> {
        self.created_at + validity
    }
}

/// Authenticated device, keyed by its identifier (usually a MAC address).
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub device_id: String,
    pub token: String,
    pub address: String,
    pub expires_at: DateTime<Utc>,
    /// Code that authorized this session.
    pub source_otp: String,
    pub(crate) seq: u64,
}

impl SessionRecord {
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Whole seconds left, zero once expired.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((self.expires_at - now).num_seconds()).unwrap_or(0)
    }
}
