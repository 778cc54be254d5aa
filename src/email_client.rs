use crate::{configuration::EmailClientSettings, domain::EmailObject};
use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    transport::smtp::{authentication::Credentials, PoolConfig},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use std::time::Duration;

/// Outbound mail capability. Implementations report transport failures to the
/// caller and never retry on their own.
#[async_trait]
pub trait GenericEmailService: Send + Sync {
    async fn send_text_email(&self, to: &str, subject: &str, body: String)
        -> Result<(), anyhow::Error>;
}

pub struct SmtpEmailClient {
    pub sender: EmailObject,
    pub mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailClient {
    #[tracing::instrument(skip(email_config), fields(relay = %email_config.base_url))]
    pub fn new(email_config: &EmailClientSettings) -> Result<Self, anyhow::Error> {
        let sender = email_config
            .sender()
            .map_err(anyhow::Error::msg)
            .context("Invalid sender email address.")?;
        let smtp_credentials = Credentials::new(
            email_config.username.to_string(),
            email_config.password.expose_secret().to_string(),
        );
        tracing::info!("Establishing  connection to the SMTP server.");
        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&email_config.base_url)?
                .credentials(smtp_credentials)
                .pool_config(
                    PoolConfig::new()
                        .min_idle(3)
                        .max_size(10)
                        .idle_timeout(Duration::new(300, 0)),
                )
                .build();

        tracing::info!("SMTP connection created succuessfully");
        Ok(Self { sender, mailer })
    }
}

#[async_trait]
impl GenericEmailService for SmtpEmailClient {
    #[tracing::instrument(name = "Send SMTP email", skip(self, body))]
    async fn send_text_email(
        &self,
        to: &str,
        subject: &str,
        body: String,
    ) -> Result<(), anyhow::Error> {
        let email = Message::builder()
            .from(self.sender.as_ref().parse()?)
            .to(to.parse()?)
            .subject(subject)
            .body(body)?;

        tracing::info!("Sending Email");
        self.mailer
            .send(email)
            .await
            .context("SMTP relay rejected the message")?;
        tracing::info!("Mail Send Successfully");
        Ok(())
    }
}

/// Mail client for local runs: logs the recipient and drops the message.
#[derive(Debug, Default)]
pub struct DummyEmailClient {}

impl DummyEmailClient {
    pub fn new() -> Self {
        tracing::info!("Dummy SMTP connection created succuessfully");
        Self {}
    }
}

#[async_trait]
impl GenericEmailService for DummyEmailClient {
    async fn send_text_email(
        &self,
        to: &str,
        subject: &str,
        _body: String,
    ) -> Result<(), anyhow::Error> {
        tracing::info!(%to, %subject, "Dummy email client dropped message");
        Ok(())
    }
}
