use serde::{Deserialize, Deserializer, Serialize};
use validator::ValidateEmail;

/// A validated email address, trimmed and lower-cased so it can key the
/// OTP store and the verification sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EmailObject(String);

impl EmailObject {
    pub fn parse(s: String) -> Result<EmailObject, String> {
        let normalized = s.trim().to_lowercase();
        if normalized.is_empty() {
            return Err("Email is required".to_string());
        }
        if normalized.validate_email() {
            Ok(Self(normalized))
        } else {
            Err(format!("{} is not a valid email.", s.trim()))
        }
    }

    pub fn get(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EmailObject {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

pub fn deserialize_email_object<'de, D>(deserializer: D) -> Result<EmailObject, D::Error>
where
    D: Deserializer<'de>,
{
    let email = String::deserialize(deserializer)?;
    EmailObject::parse(email).map_err(serde::de::Error::custom)
}
