use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};

use crate::domain::ports::{EntropyError, EntropySource};
use crate::domain::types::{SESSION_TOKEN_BYTES, SessionRecord};

#[derive(Default)]
struct SessionInner {
    records: HashMap<String, SessionRecord>,
    next_seq: u64,
}

/// Authenticated devices keyed by device id. At most one session per device.
pub struct SessionStore {
    inner: Mutex<SessionInner>,
    entropy: Arc<dyn EntropySource>,
    duration: Duration,
}

impl SessionStore {
    pub fn new(entropy: Arc<dyn EntropySource>, duration: Duration) -> Self {
        Self {
            inner: Mutex::new(SessionInner::default()),
            entropy,
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Draw a fresh token without touching the store.
    pub fn draw_token(&self) -> Result<String, EntropyError> {
        let mut bytes = [0u8; SESSION_TOKEN_BYTES];
        self.entropy.fill(&mut bytes)?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Store a session for `device_id` under a token from [`Self::draw_token`], replacing
    /// any previous one.
    pub fn insert(
        &self,
        device_id: &str,
        address: &str,
        source_otp: &str,
        token: String,
        now: DateTime<Utc>,
    ) -> SessionRecord {
        let mut inner = self.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let record = SessionRecord {
            device_id: device_id.to_owned(),
            token,
            address: address.to_owned(),
            expires_at: now + self.duration,
            source_otp: source_otp.to_owned(),
            seq,
        };
        inner.records.insert(device_id.to_owned(), record.clone());
        record
    }

    /// Create a session for `device_id`, replacing any previous one.
    pub fn create(
        &self,
        device_id: &str,
        address: &str,
        source_otp: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord, EntropyError> {
        let token = self.draw_token()?;
        Ok(self.insert(device_id, address, source_otp, token, now))
    }

    /// The device's session if it exists and `now < expires_at`.
    pub fn live_session(&self, device_id: &str, now: DateTime<Utc>) -> Option<SessionRecord> {
        self.lock()
            .records
            .get(device_id)
            .filter(|s| s.is_live_at(now))
            .cloned()
    }

    /// Drop every session with `expires_at <= now`.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut inner = self.lock();
        let before = inner.records.len();
        inner.records.retain(|_, s| s.is_live_at(now));
        before - inner.records.len()
    }

    /// Sessions in creation order; replacing a session moves the device to the end.
    pub fn snapshot(&self) -> Vec<SessionRecord> {
        let mut records: Vec<SessionRecord> = self.lock().records.values().cloned().collect();
        records.sort_by_key(|s| s.seq);
        records
    }

    pub fn live_count(&self, now: DateTime<Utc>) -> usize {
        self.lock()
            .records
            .values()
            .filter(|s| s.is_live_at(now))
            .count()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
