use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::EmailObject;

/// Existence check against the registration backend.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn user_exists(&self, email: &EmailObject) -> Result<bool, anyhow::Error>;
}

#[derive(Debug, Serialize)]
struct UserExistsRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserExistsResponse {
    user_exists: bool,
}

#[derive(Debug)]
pub struct HttpAccountDirectory {
    http_client: Client,
    base_url: String,
}

impl HttpAccountDirectory {
    pub fn new(base_url: String, timeout: std::time::Duration) -> Result<Self, anyhow::Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build account directory client")?;
        Ok(Self {
            http_client,
            base_url,
        })
    }
}

#[async_trait]
impl AccountDirectory for HttpAccountDirectory {
    #[tracing::instrument(name = "Check user exists", skip(self))]
    async fn user_exists(&self, email: &EmailObject) -> Result<bool, anyhow::Error> {
        let url = format!("{}/check-user-exists", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(&UserExistsRequest { email: email.get() })
            .send()
            .await
            .map_err(|err| anyhow!("Request error: {}", err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!(
                "Account directory responded with status {}",
                status
            ));
        }
        let body: UserExistsResponse = response
            .json()
            .await
            .map_err(|err| anyhow!("Failed to parse response: {}", err))?;
        Ok(body.user_exists)
    }
}

/// Directory backed by a fixed list of registered emails.
#[derive(Debug, Default)]
pub struct StaticAccountDirectory {
    emails: HashSet<EmailObject>,
}

impl StaticAccountDirectory {
    pub fn new(emails: impl IntoIterator<Item = EmailObject>) -> Self {
        Self {
            emails: emails.into_iter().collect(),
        }
    }
}

#[async_trait]
impl AccountDirectory for StaticAccountDirectory {
    async fn user_exists(&self, email: &EmailObject) -> Result<bool, anyhow::Error> {
        Ok(self.emails.contains(email))
    }
}
