use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::VerificationError;
use super::session::{SessionView, VerificationSession, VerificationStage};
use crate::account_client::AccountDirectory;
use crate::clock::Clock;
use crate::configuration::{LivenessSettings, SessionSettings};
use crate::constants::{ACCEPTED_DOCUMENT_TYPES, LIVENESS_SCORE_MAX, OTP_LENGTH, OTP_PATTERN};
use crate::document_store::{DocumentStore, DocumentStoreError, SubmittedDocument};
use crate::domain::EmailObject;
use crate::liveness_client::{Frame, LivenessService};
use crate::otp::{IssuedOtp, OtpManager, OtpVerification};

/// One scored camera frame.
#[derive(Debug, Clone)]
pub struct LivenessSample {
    pub score: f64,
    pub frame: Frame,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LivenessProgress {
    pub score: f64,
    pub threshold: f64,
    /// True only for the sample that triggered the still capture.
    pub captured: bool,
    pub verdict_message: Option<String>,
    pub session: SessionView,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OtpDispatch {
    pub expires_at: DateTime<Utc>,
    pub session: SessionView,
}

const OTP_REQUEST_STAGES: [VerificationStage; 3] = [
    VerificationStage::LivenessPassed,
    VerificationStage::OtpPending,
    VerificationStage::OtpFailed,
];

const OTP_RESEND_STAGES: [VerificationStage; 2] = [
    VerificationStage::LivenessPassed,
    VerificationStage::OtpPending,
];

/// Drives a session from email submission to an unlocked protected action.
///
/// Session state lives behind a single `RwLock`. The lock is never held while
/// an external capability is being called: every operation snapshots what it
/// needs, calls out, then re-acquires and re-checks the stage before writing.
/// OTP verification is the exception, since the code store is in-process.
pub struct VerificationController {
    otp_manager: Arc<OtpManager>,
    account_directory: Arc<dyn AccountDirectory>,
    liveness: Arc<dyn LivenessService>,
    documents: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    liveness_settings: LivenessSettings,
    session_settings: SessionSettings,
    sessions: RwLock<HashMap<EmailObject, VerificationSession>>,
}

impl VerificationController {
    pub fn new(
        otp_manager: Arc<OtpManager>,
        account_directory: Arc<dyn AccountDirectory>,
        liveness: Arc<dyn LivenessService>,
        documents: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        liveness_settings: LivenessSettings,
        session_settings: SessionSettings,
    ) -> Self {
        Self {
            otp_manager,
            account_directory,
            liveness,
            documents,
            clock,
            liveness_settings,
            session_settings,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn liveness_settings(&self) -> &LivenessSettings {
        &self.liveness_settings
    }

    async fn current_stage(&self, email: &EmailObject) -> Option<VerificationStage> {
        self.sessions.read().await.get(email).map(|s| s.stage)
    }

    async fn require_stage(
        &self,
        email: &EmailObject,
        allowed: &[VerificationStage],
        attempted: &str,
    ) -> Result<VerificationStage, VerificationError> {
        let current = self
            .current_stage(email)
            .await
            .unwrap_or(VerificationStage::Unverified);
        if !allowed.contains(&current) {
            return Err(VerificationError::InvalidStage {
                current,
                attempted: attempted.to_string(),
            });
        }
        Ok(current)
    }

    /// Checks the account exists and opens a fresh session waiting on the
    /// camera. An already verified session is returned as is.
    #[tracing::instrument(name = "Submit email", skip(self))]
    pub async fn submit_email(&self, email: &EmailObject) -> Result<SessionView, VerificationError> {
        if let Some(session) = self.sessions.read().await.get(email) {
            if session.stage == VerificationStage::OtpVerified {
                return Ok(session.view());
            }
        }

        let exists = self
            .account_directory
            .user_exists(email)
            .await
            .map_err(|e| {
                tracing::error!("Account existence check failed: {:?}", e);
                VerificationError::UnexpectedError(e.context("Failed to check account existence"))
            })?;
        if !exists {
            return Err(VerificationError::AccountNotFound(email.to_string()));
        }

        let now = self.clock.now();
        let mut session = VerificationSession::new(email.clone(), now);
        session.advance(VerificationStage::EmailChecked, now)?;
        session.advance(VerificationStage::LivenessCapturing, now)?;

        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(email) {
            if existing.stage == VerificationStage::OtpVerified {
                return Ok(existing.view());
            }
        }
        let view = session.view();
        sessions.insert(email.clone(), session);
        Ok(view)
    }

    /// Scores a camera frame and feeds it to the capture guard.
    #[tracing::instrument(name = "Record liveness frame", skip(self, frame))]
    pub async fn record_liveness_frame(
        &self,
        email: &EmailObject,
        frame: Frame,
    ) -> Result<LivenessProgress, VerificationError> {
        self.require_stage(
            email,
            &[VerificationStage::LivenessCapturing],
            "liveness_capturing",
        )
        .await?;
        let score = self
            .liveness
            .score_frame(email, &frame)
            .await
            .map_err(|e| {
                tracing::error!("Liveness scoring failed: {:?}", e);
                VerificationError::CaptureError(e.to_string())
            })?;
        if !score.is_finite() || !(0.0..=LIVENESS_SCORE_MAX).contains(&score) {
            return Err(VerificationError::CaptureError(format!(
                "Liveness score {} is out of range",
                score
            )));
        }
        self.consume_liveness_sample(email, LivenessSample { score, frame })
            .await
    }

    /// Applies one sample. The first sample at or above the threshold takes
    /// the still capture; every later sample is ignored until a retry.
    #[tracing::instrument(name = "Consume liveness sample", skip(self, sample), fields(score = sample.score))]
    pub async fn consume_liveness_sample(
        &self,
        email: &EmailObject,
        sample: LivenessSample,
    ) -> Result<LivenessProgress, VerificationError> {
        let threshold = self.liveness_settings.threshold;
        let now = self.clock.now();
        {
            let mut sessions = self.sessions.write().await;
            let session = match sessions.get_mut(email) {
                Some(session) if session.stage == VerificationStage::LivenessCapturing => session,
                other => {
                    return Err(VerificationError::InvalidStage {
                        current: other
                            .map(|s| s.stage)
                            .unwrap_or(VerificationStage::Unverified),
                        attempted: "liveness_capturing".to_string(),
                    });
                }
            };
            session.touch(now);
            if session.capture_triggered || sample.score < threshold {
                return Ok(LivenessProgress {
                    score: sample.score,
                    threshold,
                    captured: false,
                    verdict_message: None,
                    session: session.view(),
                });
            }
            session.capture_triggered = true;
            session.captured_at = Some(now);
        }

        tracing::info!("Liveness threshold crossed, verifying still frame");
        let verdict = self.liveness.verify_still(email, &sample.frame).await;

        let mut sessions = self.sessions.write().await;
        let session = match sessions.get_mut(email) {
            Some(session)
                if session.stage == VerificationStage::LivenessCapturing
                    && session.capture_triggered =>
            {
                session
            }
            other => {
                let current = other
                    .map(|s| s.stage)
                    .unwrap_or(VerificationStage::Unverified);
                tracing::warn!(%current, "Session changed while a capture was in flight");
                return Err(VerificationError::InvalidStage {
                    current,
                    attempted: "liveness_passed".to_string(),
                });
            }
        };
        let now = self.clock.now();
        match verdict {
            Ok(verdict) if verdict.is_success() => {
                session.liveness_passed = true;
                session.advance(VerificationStage::LivenessPassed, now)?;
                Ok(LivenessProgress {
                    score: sample.score,
                    threshold,
                    captured: true,
                    verdict_message: Some(verdict.message),
                    session: session.view(),
                })
            }
            Ok(verdict) => {
                session.advance(VerificationStage::LivenessFailed, now)?;
                Ok(LivenessProgress {
                    score: sample.score,
                    threshold,
                    captured: true,
                    verdict_message: Some(verdict.message),
                    session: session.view(),
                })
            }
            Err(e) => {
                tracing::error!("Liveness verdict call failed: {:?}", e);
                session.capture_triggered = false;
                session.touch(now);
                Err(VerificationError::CaptureError(e.to_string()))
            }
        }
    }

    #[tracing::instrument(name = "Retry liveness", skip(self))]
    pub async fn retry_liveness(&self, email: &EmailObject) -> Result<SessionView, VerificationError> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(email)
            .ok_or(VerificationError::InvalidStage {
                current: VerificationStage::Unverified,
                attempted: "liveness_capturing".to_string(),
            })?;
        if session.stage != VerificationStage::LivenessFailed {
            return Err(VerificationError::InvalidStage {
                current: session.stage,
                attempted: "liveness_capturing".to_string(),
            });
        }
        session.advance(VerificationStage::LivenessCapturing, now)?;
        session.capture_triggered = false;
        Ok(session.view())
    }

    /// Issues a fresh code and mails it. A delivery failure leaves the stage
    /// where it was.
    #[tracing::instrument(name = "Request OTP", skip(self))]
    pub async fn request_otp(&self, email: &EmailObject) -> Result<OtpDispatch, VerificationError> {
        self.require_stage(email, &OTP_REQUEST_STAGES, "otp_pending")
            .await?;
        let issued = self.otp_manager.issue(email).await;
        self.otp_manager.deliver(email, &issued.code).await?;
        self.mark_otp_pending(email, &OTP_REQUEST_STAGES, &issued)
            .await
    }

    /// Re-delivers the live code, or a fresh one when it has lapsed.
    #[tracing::instrument(name = "Resend OTP", skip(self))]
    pub async fn resend_otp(&self, email: &EmailObject) -> Result<OtpDispatch, VerificationError> {
        self.require_stage(email, &OTP_RESEND_STAGES, "otp_pending")
            .await?;
        let issued = self.otp_manager.resend(email).await?;
        self.mark_otp_pending(email, &OTP_RESEND_STAGES, &issued)
            .await
    }

    async fn mark_otp_pending(
        &self,
        email: &EmailObject,
        allowed: &[VerificationStage],
        issued: &IssuedOtp,
    ) -> Result<OtpDispatch, VerificationError> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(email)
            .filter(|s| allowed.contains(&s.stage) && s.liveness_passed)
            .ok_or_else(|| {
                VerificationError::UnexpectedError(anyhow::anyhow!(
                    "Session for {} changed while the OTP was being sent",
                    email
                ))
            })?;
        session.advance(VerificationStage::OtpPending, now)?;
        Ok(OtpDispatch {
            expires_at: issued.expires_at,
            session: session.view(),
        })
    }

    #[tracing::instrument(name = "Verify OTP", skip(self, code))]
    pub async fn verify_otp(
        &self,
        email: &EmailObject,
        code: &SecretString,
    ) -> Result<SessionView, VerificationError> {
        let code = code.expose_secret().trim();
        if !OTP_PATTERN.is_match(code) {
            return Err(VerificationError::ValidationError(format!(
                "OTP must be exactly {} digits",
                OTP_LENGTH
            )));
        }
        let now = self.clock.now();
        // Held across the consume so a concurrent guess cannot move the stage
        // between the store check and the session write.
        let mut sessions = self.sessions.write().await;
        let session = match sessions.get_mut(email) {
            Some(session) if session.stage == VerificationStage::OtpPending => session,
            _ => return Err(VerificationError::OtpNotFound),
        };
        let outcome = self.otp_manager.verify(email, code).await;
        match outcome {
            OtpVerification::Valid => {
                session.otp_verified = true;
                session.advance(VerificationStage::OtpVerified, now)?;
                Ok(session.view())
            }
            OtpVerification::Invalid => {
                session.advance(VerificationStage::OtpFailed, now)?;
                Err(VerificationError::Mismatch)
            }
            OtpVerification::Expired => {
                session.advance(VerificationStage::OtpFailed, now)?;
                Err(VerificationError::Expired)
            }
            OtpVerification::NotFound => {
                session.advance(VerificationStage::OtpFailed, now)?;
                Err(VerificationError::OtpNotFound)
            }
        }
    }

    pub async fn authorize_protected_action(
        &self,
        email: &EmailObject,
    ) -> Result<(), VerificationError> {
        match self.current_stage(email).await {
            Some(VerificationStage::OtpVerified) => Ok(()),
            _ => Err(VerificationError::Unauthorized(
                "Complete liveness and OTP verification before submitting".to_string(),
            )),
        }
    }

    #[tracing::instrument(name = "Submit document", skip(self, document))]
    pub async fn submit_document(
        &self,
        email: &EmailObject,
        document: SubmittedDocument,
    ) -> Result<Uuid, VerificationError> {
        self.authorize_protected_action(email).await?;
        if !ACCEPTED_DOCUMENT_TYPES.contains(&document.content_type.as_str()) {
            return Err(VerificationError::ValidationError(format!(
                "Unsupported document type {}",
                document.content_type
            )));
        }
        if document.bytes.is_empty() {
            return Err(VerificationError::ValidationError(
                "Document is empty".to_string(),
            ));
        }
        let id = self
            .documents
            .store(email, document)
            .await
            .map_err(|e| match e {
                DocumentStoreError::AlreadyRegistered(_) => {
                    VerificationError::DuplicateSubmission(e.to_string())
                }
                DocumentStoreError::Unexpected(inner) => VerificationError::UnexpectedError(inner),
            })?;
        tracing::info!(%id, "Document stored");
        Ok(id)
    }

    pub async fn session(&self, email: &EmailObject) -> Option<SessionView> {
        self.sessions.read().await.get(email).map(|s| s.view())
    }

    #[tracing::instrument(name = "Purge idle sessions", skip(self))]
    pub async fn purge_idle_sessions(&self) -> usize {
        let cutoff = self.clock.now() - self.session_settings.ttl();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.updated_at >= cutoff);
        let purged = before - sessions.len();
        if purged > 0 {
            tracing::debug!(purged, "Purged idle verification sessions");
        }
        purged
    }

    pub fn spawn_session_reaper(self: Arc<Self>, period: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.purge_idle_sessions().await;
            }
        })
    }
}
