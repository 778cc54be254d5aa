use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use super::session::VerificationStage;
use crate::otp::OtpError;
use crate::schemas::GenericResponse;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum VerificationError {
    #[error("{0}")]
    ValidationError(String),
    #[error("No account is registered for {0}")]
    AccountNotFound(String),
    #[error("No OTP found. Please request a new one")]
    OtpNotFound,
    #[error("OTP has expired. Please request a new one")]
    Expired,
    #[error("Invalid OTP. Please request a new one")]
    Mismatch,
    #[error("Failed to send OTP. Please try again")]
    DeliveryError(#[from] OtpError),
    #[error("Liveness capture failed: {0}")]
    CaptureError(String),
    #[error("Cannot move to {attempted} while the session is {current}")]
    InvalidStage {
        current: VerificationStage,
        attempted: String,
    },
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    DuplicateSubmission(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for VerificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for VerificationError {
    fn status_code(&self) -> StatusCode {
        match self {
            VerificationError::ValidationError(_) => StatusCode::BAD_REQUEST,
            VerificationError::AccountNotFound(_) => StatusCode::NOT_FOUND,
            VerificationError::OtpNotFound
            | VerificationError::Expired
            | VerificationError::Mismatch => StatusCode::OK,
            VerificationError::DeliveryError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            VerificationError::CaptureError(_) => StatusCode::SERVICE_UNAVAILABLE,
            VerificationError::InvalidStage { .. } => StatusCode::CONFLICT,
            VerificationError::Unauthorized(_) => StatusCode::FORBIDDEN,
            VerificationError::DuplicateSubmission(_) => StatusCode::CONFLICT,
            VerificationError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let status_code_str = status_code.as_str();
        let inner_error_msg = match self {
            VerificationError::UnexpectedError(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(status_code).json(GenericResponse::error(
            &inner_error_msg,
            status_code_str,
            Some(()),
        ))
    }
}
