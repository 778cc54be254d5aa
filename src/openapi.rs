use utoipa::OpenApi;

use crate::routes::document::{handlers as document_handlers, schemas as document_schemas};
use crate::routes::util::handlers as util_handlers;
use crate::routes::verification::{handlers as verification_handlers, schemas as verification_schemas};
use crate::verification::{LivenessProgress, OtpDispatch, SessionView, VerificationStage};

#[derive(OpenApi)]
#[openapi(
    paths(
        util_handlers::health_check,
        verification_handlers::submit_email,
        verification_handlers::record_liveness_frame,
        verification_handlers::retry_liveness,
        verification_handlers::request_otp,
        verification_handlers::resend_otp,
        verification_handlers::verify_otp,
        verification_handlers::get_session,
        document_handlers::submit_document,
    ),
    components(schemas(
        verification_schemas::EmailRequest,
        verification_schemas::EmailSubmission,
        verification_schemas::CaptureGuide,
        verification_schemas::LivenessFrameRequest,
        verification_schemas::OtpVerifyRequest,
        document_schemas::DocumentSubmitRequest,
        document_schemas::DocumentReceipt,
        SessionView,
        VerificationStage,
        LivenessProgress,
        OtpDispatch,
    )),
    tags(
        (name = "Verification", description = "Liveness and OTP verification workflow"),
        (name = "Document", description = "Document submission gated on a verified session"),
        (name = "Util", description = "Operational endpoints"),
    ),
)]
pub struct ApiDoc {}
