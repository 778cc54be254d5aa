use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

/// The single live passcode held for an email.
pub struct OtpRecord {
    pub code: SecretString,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OtpRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn matches(&self, submitted: &str) -> bool {
        self.code.expose_secret() == submitted
    }
}

impl std::fmt::Debug for OtpRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpRecord")
            .field("code", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// What `issue` hands back for delivery.
#[derive(Debug)]
pub struct IssuedOtp {
    pub code: SecretString,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpVerification {
    Valid,
    Invalid,
    Expired,
    NotFound,
}
