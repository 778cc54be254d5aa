use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::models::{IssuedOtp, OtpRecord, OtpVerification};
use crate::domain::EmailObject;

/// Keyed OTP records. Every operation runs under one lock acquisition, so a
/// verify can never interleave with an issue for the same email.
#[derive(Debug, Default)]
pub struct OtpStore {
    records: Mutex<HashMap<EmailObject, OtpRecord>>,
}

impl OtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever record the email held before.
    pub async fn insert(&self, email: EmailObject, record: OtpRecord) {
        self.records.lock().await.insert(email, record);
    }

    /// Returns a copy of the record if it is still live.
    pub async fn live_record(&self, email: &EmailObject, now: DateTime<Utc>) -> Option<IssuedOtp> {
        let records = self.records.lock().await;
        records
            .get(email)
            .filter(|record| !record.is_expired(now))
            .map(|record| IssuedOtp {
                code: SecretString::from(record.code.expose_secret().to_owned()),
                issued_at: record.issued_at,
                expires_at: record.expires_at,
            })
    }

    pub async fn check_and_consume(
        &self,
        email: &EmailObject,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> OtpVerification {
        let mut records = self.records.lock().await;
        let Some(record) = records.get(email) else {
            return OtpVerification::NotFound;
        };
        if record.is_expired(now) {
            records.remove(email);
            return OtpVerification::Expired;
        }
        if !record.matches(submitted) {
            return OtpVerification::Invalid;
        }
        records.remove(email);
        OtpVerification::Valid
    }

    /// Drops every record whose window has closed; returns how many went.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, record| record.expires_at >= now);
        before - records.len()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}
