use config::{self, ConfigError, Environment};
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use crate::domain::EmailObject;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub email_client: EmailClientSettings,
    pub otp: OtpSettings,
    pub liveness: LivenessSettings,
    pub account_directory: AccountDirectorySettings,
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationSettings {
    pub port: u16,
    pub host: String,
    pub workers: usize,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmailClientKind {
    Smtp,
    Dummy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailClientSettings {
    pub kind: EmailClientKind,
    pub base_url: String,
    pub username: String,
    pub password: SecretString,
    pub sender_email: String,
}

impl EmailClientSettings {
    pub fn sender(&self) -> Result<EmailObject, String> {
        EmailObject::parse(self.sender_email.clone())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OtpSettings {
    pub validity_secs: u64,
    pub sweep_interval_secs: u64,
    pub email_subject: String,
}

impl OtpSettings {
    pub fn validity(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.validity_secs as i64)
    }

    /// Never shorter than one second; `tokio::time::interval` rejects zero.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs).max(MIN_SWEEP_INTERVAL)
    }
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            validity_secs: 300,
            sweep_interval_secs: 60,
            email_subject: "Your OTP Code".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LivenessSettings {
    pub threshold: f64,
    pub poll_interval_ms: u64,
    pub max_samples: usize,
    pub base_url: String,
    pub timeout_ms: u64,
}

impl LivenessSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms).max(MIN_POLL_INTERVAL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountDirectoryKind {
    Http,
    Static,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AccountDirectorySettings {
    pub kind: AccountDirectoryKind,
    pub base_url: String,
    pub timeout_ms: u64,
    #[serde(default)]
    pub registered_emails: Vec<String>,
}

impl AccountDirectorySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    pub ttl_secs: u64,
}

impl SessionSettings {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_secs as i64)
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");
    let builder = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("configuration.yaml"),
        ))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("application.allowed_origins")
                .with_list_parse_key("account_directory.registered_emails")
                .try_parsing(true),
        )
        .build()?;
    builder.try_deserialize::<Settings>()
}
