use anyhow::{anyhow, Context};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::EmailObject;

/// One video frame as delivered by the camera, encoded as an image.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame(Vec<u8>);

impl Frame {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Accepts plain base64 or a `data:image/...;base64,` URL.
    pub fn from_base64(encoded: &str) -> Result<Self, anyhow::Error> {
        let payload = match encoded.split_once(',') {
            Some((header, data)) if header.starts_with("data:") => data,
            _ => encoded,
        };
        let bytes = BASE64
            .decode(payload.trim())
            .context("Frame is not valid base64")?;
        if bytes.is_empty() {
            return Err(anyhow!("Frame is empty"));
        }
        Ok(Self(bytes))
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame({} bytes)", self.0.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictOutcome {
    Success,
    #[serde(alias = "fail")]
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivenessVerdict {
    #[serde(rename = "result")]
    pub outcome: VerdictOutcome,
    #[serde(default)]
    pub message: String,
}

impl LivenessVerdict {
    pub fn is_success(&self) -> bool {
        self.outcome == VerdictOutcome::Success
    }
}

/// Liveness / face-match capability: a continuous score for live frames and a
/// pass/fail verdict for a captured still.
#[async_trait]
pub trait LivenessService: Send + Sync {
    async fn score_frame(&self, email: &EmailObject, frame: &Frame) -> Result<f64, anyhow::Error>;

    async fn verify_still(
        &self,
        email: &EmailObject,
        frame: &Frame,
    ) -> Result<LivenessVerdict, anyhow::Error>;
}

#[derive(Debug, Serialize)]
struct ScoreFrameRequest<'a> {
    email: &'a str,
    frame_base64: String,
}

#[derive(Debug, Deserialize)]
struct ScoreFrameResponse {
    score: f64,
}

#[derive(Debug, Serialize)]
struct VerifyPhotoRequest<'a> {
    email: &'a str,
    photo_base64: String,
}

#[derive(Debug)]
pub struct HttpLivenessClient {
    http_client: Client,
    base_url: String,
}

impl HttpLivenessClient {
    pub fn new(base_url: String, timeout: std::time::Duration) -> Result<Self, anyhow::Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build liveness client")?;
        Ok(Self {
            http_client,
            base_url,
        })
    }
}

#[async_trait]
impl LivenessService for HttpLivenessClient {
    #[tracing::instrument(name = "Score liveness frame", skip(self, frame))]
    async fn score_frame(&self, email: &EmailObject, frame: &Frame) -> Result<f64, anyhow::Error> {
        let url = format!("{}/liveness/score", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(&ScoreFrameRequest {
                email: email.get(),
                frame_base64: frame.to_base64(),
            })
            .send()
            .await
            .map_err(|err| anyhow!("Request error: {}", err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Liveness scoring responded with status {}", status));
        }
        let body: ScoreFrameResponse = response
            .json()
            .await
            .map_err(|err| anyhow!("Failed to parse response: {}", err))?;
        Ok(body.score)
    }

    #[tracing::instrument(name = "Verify liveness still", skip(self, frame))]
    async fn verify_still(
        &self,
        email: &EmailObject,
        frame: &Frame,
    ) -> Result<LivenessVerdict, anyhow::Error> {
        let url = format!("{}/verify-aadhar-photo", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(&VerifyPhotoRequest {
                email: email.get(),
                photo_base64: frame.to_base64(),
            })
            .send()
            .await
            .map_err(|err| anyhow!("Request error: {}", err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Liveness verdict responded with status {}", status));
        }
        response
            .json::<LivenessVerdict>()
            .await
            .map_err(|err| anyhow!("Failed to parse response: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::{Frame, LivenessVerdict, VerdictOutcome};

    #[test]
    fn frame_accepts_data_url_prefix() {
        let plain = Frame::from_base64("aGVsbG8=").unwrap();
        let data_url = Frame::from_base64("data:image/jpeg;base64,aGVsbG8=").unwrap();
        assert_eq!(plain, data_url);
        assert_eq!(plain.as_bytes(), b"hello");
    }

    #[test]
    fn frame_rejects_garbage_and_empty_input() {
        assert!(Frame::from_base64("***").is_err());
        assert!(Frame::from_base64("").is_err());
    }

    #[test]
    fn verdict_parses_both_failure_spellings() {
        let fail: LivenessVerdict =
            serde_json::from_str(r#"{"result": "fail", "message": "Face does not match."}"#)
                .unwrap();
        let failure: LivenessVerdict =
            serde_json::from_str(r#"{"result": "failure", "message": ""}"#).unwrap();
        let success: LivenessVerdict =
            serde_json::from_str(r#"{"result": "success", "message": "ok"}"#).unwrap();
        assert_eq!(fail.outcome, VerdictOutcome::Failure);
        assert_eq!(failure.outcome, VerdictOutcome::Failure);
        assert!(success.is_success());
    }
}
