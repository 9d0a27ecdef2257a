use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};

use crate::domain::ports::{EntropyError, EntropySource};
use crate::domain::types::{OtpRecord, OtpState, OtpStatus};
use crate::error::OtpAuthError;

/// Upper bound on collision re-draws before giving up on issuance.
const MAX_DRAWS: usize = 64;

/// Digits come from bytes below this bound so `byte % 10` stays uniform.
const UNBIASED_BYTE_LIMIT: u8 = 250;

/// Aggregate counts over the tracked OTPs at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OtpCounts {
    pub active: usize,
    pub used: usize,
    pub tracked: usize,
    pub total_issued: u64,
}

#[derive(Default)]
struct OtpInner {
    records: HashMap<String, OtpRecord>,
    next_seq: u64,
    total_issued: u64,
}

/// Outstanding passcodes keyed by code.
///
/// Every read-modify-write runs under one mutex, so a code can only be claimed once and
/// two issuances can never hand out the same code.
pub struct OtpStore {
    inner: Mutex<OtpInner>,
    entropy: Arc<dyn EntropySource>,
    code_length: usize,
    validity: Duration,
}

impl OtpStore {
    pub fn new(entropy: Arc<dyn EntropySource>, code_length: usize, validity: Duration) -> Self {
        Self {
            inner: Mutex::new(OtpInner::default()),
            entropy,
            code_length,
            validity,
        }
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    fn lock(&self) -> MutexGuard<'_, OtpInner> {
        // A panic mid-operation cannot leave a half-written record: every mutation is a
        // single insert/remove/field store.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn draw_code(&self) -> Result<String, EntropyError> {
        let mut code = String::with_capacity(self.code_length);
        let mut buf = [0u8; 16];
        while code.len() < self.code_length {
            self.entropy.fill(&mut buf)?;
            for byte in buf {
                if code.len() == self.code_length {
                    break;
                }
                if byte < UNBIASED_BYTE_LIMIT {
                    code.push(char::from(b'0' + byte % 10));
                }
            }
        }
        Ok(code)
    }

    /// Record a new Active code for `address`, re-drawing on collision with any tracked
    /// code (claimed or not).
    pub fn issue(&self, address: &str, now: DateTime<Utc>) -> Result<String, EntropyError> {
        let mut inner = self.lock();
        for _ in 0..MAX_DRAWS {
            let code = self.draw_code()?;
            if inner.records.contains_key(&code) {
                continue;
            }
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.total_issued += 1;
            inner.records.insert(
                code.clone(),
                OtpRecord {
                    code: code.clone(),
                    address: address.to_owned(),
                    created_at: now,
                    state: OtpState::Active,
                    claimed_by: None,
                    seq,
                },
            );
            return Ok(code);
        }
        Err(EntropyError::Exhausted {
            attempts: MAX_DRAWS,
        })
    }

    pub fn lookup(&self, code: &str) -> Option<OtpRecord> {
        self.lock().records.get(code).cloned()
    }

    /// Claim `code` for `device_id`. Age is checked in the same critical section as the
    /// transition, so an expired code that has not been swept still fails.
    pub fn mark_used(
        &self,
        code: &str,
        device_id: &str,
        now: DateTime<Utc>,
    ) -> Result<OtpRecord, OtpAuthError> {
        let mut inner = self.lock();
        let record = inner
            .records
            .get_mut(code)
            .ok_or(OtpAuthError::InvalidCode)?;
        if record.state == OtpState::Used {
            return Err(OtpAuthError::AlreadyUsed);
        }
        if record.is_expired_at(now, self.validity) {
            return Err(OtpAuthError::Expired);
        }
        record.state = OtpState::Used;
        record.claimed_by = Some(device_id.to_owned());
        Ok(record.clone())
    }

    /// Drop every record past the validity window, used or not.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let validity = self.validity;
        let mut inner = self.lock();
        let before = inner.records.len();
        inner
            .records
            .retain(|_, record| !record.is_expired_at(now, validity));
        before - inner.records.len()
    }

    /// Records in issue order.
    pub fn snapshot(&self) -> Vec<OtpRecord> {
        let mut records: Vec<OtpRecord> = self.lock().records.values().cloned().collect();
        records.sort_by_key(|r| r.seq);
        records
    }

    pub fn counts(&self, now: DateTime<Utc>) -> OtpCounts {
        let inner = self.lock();
        let mut counts = OtpCounts {
            tracked: inner.records.len(),
            total_issued: inner.total_issued,
            ..OtpCounts::default()
        };
        for record in inner.records.values() {
            match record.status_at(now, self.validity) {
                OtpStatus::Active => counts.active += 1,
                OtpStatus::Used => counts.used += 1,
                OtpStatus::Expired => {}
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
