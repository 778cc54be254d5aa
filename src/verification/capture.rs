use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use super::controller::VerificationController;
use super::errors::VerificationError;
use super::session::{SessionView, VerificationStage};
use crate::domain::EmailObject;
use crate::liveness_client::Frame;

/// A camera, or anything else that yields frames on demand.
#[async_trait]
pub trait FrameSource: Send {
    /// `Ok(None)` means the stream has ended.
    async fn next_frame(&mut self) -> Result<Option<Frame>, anyhow::Error>;
}

#[async_trait]
impl FrameSource for VecDeque<Frame> {
    async fn next_frame(&mut self) -> Result<Option<Frame>, anyhow::Error> {
        Ok(self.pop_front())
    }
}

/// Polls `source` every `cadence` and feeds each frame to the controller
/// until the session leaves `LivenessCapturing`.
#[tracing::instrument(name = "Run liveness capture", skip(controller, source))]
pub async fn run_liveness_capture(
    controller: &VerificationController,
    email: &EmailObject,
    source: &mut dyn FrameSource,
    cadence: Duration,
    max_samples: usize,
) -> Result<SessionView, VerificationError> {
    let mut ticker = tokio::time::interval(cadence.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for sample in 0..max_samples {
        ticker.tick().await;
        let frame = source
            .next_frame()
            .await
            .map_err(|e| VerificationError::CaptureError(e.to_string()))?
            .ok_or_else(|| {
                VerificationError::CaptureError(
                    "Camera stream ended before a capture was taken".to_string(),
                )
            })?;
        let progress = controller.record_liveness_frame(email, frame).await?;
        if progress.session.stage != VerificationStage::LivenessCapturing {
            tracing::info!(sample, stage = %progress.session.stage, "Liveness capture finished");
            return Ok(progress.session);
        }
    }
    Err(VerificationError::CaptureError(format!(
        "No frame reached the liveness threshold within {} samples",
        max_samples
    )))
}
