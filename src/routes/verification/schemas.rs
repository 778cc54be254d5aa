use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::configuration::LivenessSettings;
use crate::domain::{deserialize_email_object, EmailObject};
use crate::verification::SessionView;

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    #[serde(deserialize_with = "deserialize_email_object")]
    #[schema(value_type = String, example = "a@x.com")]
    pub email: EmailObject,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LivenessFrameRequest {
    #[serde(deserialize_with = "deserialize_email_object")]
    #[schema(value_type = String, example = "a@x.com")]
    pub email: EmailObject,
    /// Base64 image, optionally as a `data:image/...;base64,` URL.
    #[schema(value_type = String, format = Byte)]
    pub frame: String,
}

impl std::fmt::Debug for LivenessFrameRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivenessFrameRequest")
            .field("email", &self.email)
            .field("frame_len", &self.frame.len())
            .finish()
    }
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OtpVerifyRequest {
    #[serde(deserialize_with = "deserialize_email_object")]
    #[schema(value_type = String, example = "a@x.com")]
    pub email: EmailObject,
    #[schema(value_type = String, example = "483920")]
    pub code: SecretString,
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SessionQuery {
    #[serde(deserialize_with = "deserialize_email_object")]
    #[param(value_type = String)]
    pub email: EmailObject,
}

/// How the client should drive the camera loop.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptureGuide {
    pub threshold: f64,
    pub poll_interval_ms: u64,
    pub max_samples: usize,
}

impl From<&LivenessSettings> for CaptureGuide {
    fn from(settings: &LivenessSettings) -> Self {
        Self {
            threshold: settings.threshold,
            poll_interval_ms: settings.poll_interval().as_millis() as u64,
            max_samples: settings.max_samples,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailSubmission {
    #[serde(flatten)]
    pub session: SessionView,
    pub capture: CaptureGuide,
}
