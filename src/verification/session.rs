use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::errors::VerificationError;
use crate::domain::EmailObject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStage {
    Unverified,
    EmailChecked,
    LivenessCapturing,
    LivenessPassed,
    LivenessFailed,
    OtpPending,
    OtpVerified,
    OtpFailed,
}

impl VerificationStage {
    pub fn can_advance_to(self, next: VerificationStage) -> bool {
        use VerificationStage::*;
        matches!(
            (self, next),
            (Unverified, EmailChecked)
                | (EmailChecked, LivenessCapturing)
                | (LivenessCapturing, LivenessPassed)
                | (LivenessCapturing, LivenessFailed)
                | (LivenessFailed, LivenessCapturing)
                | (LivenessPassed, OtpPending)
                | (OtpPending, OtpPending)
                | (OtpPending, OtpVerified)
                | (OtpPending, OtpFailed)
                | (OtpFailed, OtpPending)
        )
    }
}

impl std::fmt::Display for VerificationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            VerificationStage::Unverified => "unverified",
            VerificationStage::EmailChecked => "email_checked",
            VerificationStage::LivenessCapturing => "liveness_capturing",
            VerificationStage::LivenessPassed => "liveness_passed",
            VerificationStage::LivenessFailed => "liveness_failed",
            VerificationStage::OtpPending => "otp_pending",
            VerificationStage::OtpVerified => "otp_verified",
            VerificationStage::OtpFailed => "otp_failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct VerificationSession {
    pub email: EmailObject,
    pub stage: VerificationStage,
    pub liveness_passed: bool,
    pub otp_verified: bool,
    pub captured_at: Option<DateTime<Utc>>,
    /// Set by the first sample over the threshold; cleared only by a retry or
    /// a failed verdict call.
    pub capture_triggered: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VerificationSession {
    pub fn new(email: EmailObject, now: DateTime<Utc>) -> Self {
        Self {
            email,
            stage: VerificationStage::Unverified,
            liveness_passed: false,
            otp_verified: false,
            captured_at: None,
            capture_triggered: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn advance(
        &mut self,
        next: VerificationStage,
        now: DateTime<Utc>,
    ) -> Result<(), VerificationError> {
        if !self.stage.can_advance_to(next) {
            return Err(VerificationError::InvalidStage {
                current: self.stage,
                attempted: next.to_string(),
            });
        }
        tracing::info!(from = %self.stage, to = %next, "Verification stage advanced");
        self.stage = next;
        self.updated_at = now;
        Ok(())
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            email: self.email.to_string(),
            stage: self.stage,
            liveness_passed: self.liveness_passed,
            otp_verified: self.otp_verified,
            captured_at: self.captured_at,
            updated_at: self.updated_at,
        }
    }
}

/// Client-facing snapshot of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub email: String,
    pub stage: VerificationStage,
    pub liveness_passed: bool,
    pub otp_verified: bool,
    pub captured_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::{VerificationSession, VerificationStage};
    use crate::tests::tests::email;
    use crate::verification::VerificationError;
    use chrono::Utc;

    const ALL: [VerificationStage; 8] = [
        VerificationStage::Unverified,
        VerificationStage::EmailChecked,
        VerificationStage::LivenessCapturing,
        VerificationStage::LivenessPassed,
        VerificationStage::LivenessFailed,
        VerificationStage::OtpPending,
        VerificationStage::OtpVerified,
        VerificationStage::OtpFailed,
    ];

    #[test]
    fn only_liveness_passed_and_otp_stages_lead_to_otp_pending() {
        let sources: Vec<_> = ALL
            .iter()
            .filter(|stage| stage.can_advance_to(VerificationStage::OtpPending))
            .copied()
            .collect();
        assert_eq!(
            sources,
            vec![
                VerificationStage::LivenessPassed,
                VerificationStage::OtpPending,
                VerificationStage::OtpFailed,
            ]
        );
    }

    #[test]
    fn otp_verified_is_terminal() {
        assert!(ALL
            .iter()
            .all(|next| !VerificationStage::OtpVerified.can_advance_to(*next)));
    }

    #[test]
    fn illegal_advance_leaves_session_untouched() {
        let now = Utc::now();
        let mut session = VerificationSession::new(email("a@x.com"), now);
        let err = session
            .advance(VerificationStage::OtpPending, now)
            .unwrap_err();
        assert!(matches!(
            err,
            VerificationError::InvalidStage {
                current: VerificationStage::Unverified,
                ..
            }
        ));
        assert_eq!(session.stage, VerificationStage::Unverified);
    }

    #[test]
    fn stage_serializes_as_snake_case() {
        let json = serde_json::to_string(&VerificationStage::LivenessCapturing).unwrap();
        assert_eq!(json, "\"liveness_capturing\"");
        assert_eq!(
            VerificationStage::OtpVerified.to_string(),
            "otp_verified"
        );
    }
}
