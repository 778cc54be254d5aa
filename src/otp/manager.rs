use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::errors::OtpError;
use super::generator::OtpGenerator;
use super::models::{IssuedOtp, OtpRecord, OtpVerification};
use super::store::OtpStore;
use crate::clock::Clock;
use crate::configuration::OtpSettings;
use crate::domain::EmailObject;
use crate::email_client::GenericEmailService;

/// Issues, delivers, checks and retires one-time passcodes.
///
/// The manager owns its [`OtpStore`]; callers only ever see codes through
/// [`OtpManager::issue`] and [`OtpManager::verify`].
pub struct OtpManager {
    store: OtpStore,
    email_client: Arc<dyn GenericEmailService>,
    generator: Arc<dyn OtpGenerator>,
    clock: Arc<dyn Clock>,
    settings: OtpSettings,
}

impl OtpManager {
    pub fn new(
        settings: OtpSettings,
        email_client: Arc<dyn GenericEmailService>,
        generator: Arc<dyn OtpGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store: OtpStore::new(),
            email_client,
            generator,
            clock,
            settings,
        }
    }

    #[tracing::instrument(name = "Issue OTP", skip(self))]
    pub async fn issue(&self, email: &EmailObject) -> IssuedOtp {
        let issued_at = self.clock.now();
        let expires_at = issued_at + self.settings.validity();
        let code = self.generator.generate();
        self.store
            .insert(
                email.clone(),
                OtpRecord {
                    code: SecretString::from(code.clone()),
                    issued_at,
                    expires_at,
                },
            )
            .await;
        tracing::info!(%expires_at, "OTP issued");
        IssuedOtp {
            code: SecretString::from(code),
            issued_at,
            expires_at,
        }
    }

    /// Sends the code by mail. A failure leaves the stored record untouched.
    #[tracing::instrument(name = "Deliver OTP", skip(self, code))]
    pub async fn deliver(&self, email: &EmailObject, code: &SecretString) -> Result<(), OtpError> {
        let body = format!(
            "Your OTP is {}. It expires in {} minutes.",
            code.expose_secret(),
            self.settings.validity().num_minutes()
        );
        self.email_client
            .send_text_email(email.get(), &self.settings.email_subject, body)
            .await
            .map_err(|source| {
                tracing::error!("Failed to deliver OTP: {:?}", source);
                OtpError::Delivery {
                    email: email.to_string(),
                    source,
                }
            })
    }

    /// Re-delivers the live code if there is one, otherwise issues a new one.
    #[tracing::instrument(name = "Resend OTP", skip(self))]
    pub async fn resend(&self, email: &EmailObject) -> Result<IssuedOtp, OtpError> {
        let issued = match self.store.live_record(email, self.clock.now()).await {
            Some(issued) => {
                tracing::info!("Re-delivering live OTP");
                issued
            }
            None => self.issue(email).await,
        };
        self.deliver(email, &issued.code).await?;
        Ok(issued)
    }

    #[tracing::instrument(name = "Verify OTP", skip(self, submitted))]
    pub async fn verify(&self, email: &EmailObject, submitted: &str) -> OtpVerification {
        let outcome = self
            .store
            .check_and_consume(email, submitted, self.clock.now())
            .await;
        tracing::info!(?outcome, "OTP verification finished");
        outcome
    }

    #[tracing::instrument(name = "Sweep expired OTPs", skip(self))]
    pub async fn sweep(&self) -> usize {
        let purged = self.store.purge_expired(self.clock.now()).await;
        if purged > 0 {
            tracing::debug!(purged, "Purged expired OTP records");
        }
        purged
    }

    pub async fn active_records(&self) -> usize {
        self.store.len().await
    }

    /// Runs [`OtpManager::sweep`] on the configured interval until the handle
    /// is aborted.
    pub fn spawn_sweeper(self: Arc<Self>) -> JoinHandle<()> {
        let period = self.settings.sweep_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.sweep().await;
            }
        })
    }
}
