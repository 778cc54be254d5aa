mod capture;
mod controller;
mod errors;
mod session;

pub use capture::{run_liveness_capture, FrameSource};
pub use controller::{LivenessProgress, LivenessSample, OtpDispatch, VerificationController};
pub use errors::VerificationError;
pub use session::{SessionView, VerificationSession, VerificationStage};
