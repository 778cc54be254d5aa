use actix_web::web;
use utoipa::TupleUnit;

use super::schemas::{
    CaptureGuide, EmailRequest, EmailSubmission, LivenessFrameRequest, OtpVerifyRequest,
    SessionQuery,
};
use crate::liveness_client::Frame;
use crate::schemas::GenericResponse;
use crate::verification::{
    LivenessProgress, OtpDispatch, SessionView, VerificationController, VerificationError,
};

#[utoipa::path(
    post,
    path = "/verification/email",
    tag = "Verification",
    request_body(content = EmailRequest, description = "Request Body"),
    responses(
        (status=200, description= "Session opened, camera should start", body= GenericResponse<EmailSubmission>),
        (status=400, description= "Missing or malformed email", body= GenericResponse<TupleUnit>),
        (status=404, description= "No account for this email", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(err, name = "Submit Email API", skip(controller), fields(email = %body.email))]
pub async fn submit_email(
    body: web::Json<EmailRequest>,
    controller: web::Data<VerificationController>,
) -> Result<web::Json<GenericResponse<EmailSubmission>>, VerificationError> {
    let session = controller.submit_email(&body.email).await?;
    let submission = EmailSubmission {
        session,
        capture: CaptureGuide::from(controller.liveness_settings()),
    };
    Ok(web::Json(GenericResponse::success(
        "Account found. Start liveness capture",
        Some(submission),
    )))
}

#[utoipa::path(
    post,
    path = "/verification/liveness/frame",
    tag = "Verification",
    request_body(content = LivenessFrameRequest, description = "Request Body"),
    responses(
        (status=200, description= "Frame scored", body= GenericResponse<LivenessProgress>),
        (status=409, description= "Session is not capturing", body= GenericResponse<TupleUnit>),
        (status=503, description= "Liveness service failed", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(err, name = "Liveness Frame API", skip(controller, body), fields(email = %body.email))]
pub async fn record_liveness_frame(
    body: web::Json<LivenessFrameRequest>,
    controller: web::Data<VerificationController>,
) -> Result<web::Json<GenericResponse<LivenessProgress>>, VerificationError> {
    let frame = Frame::from_base64(&body.frame)
        .map_err(|e| VerificationError::ValidationError(e.to_string()))?;
    let progress = controller.record_liveness_frame(&body.email, frame).await?;
    let message = match (progress.captured, progress.session.liveness_passed) {
        (true, true) => "Liveness verified",
        (true, false) => "Liveness check failed",
        (false, _) => "Frame recorded",
    };
    Ok(web::Json(GenericResponse::success(message, Some(progress))))
}

#[utoipa::path(
    post,
    path = "/verification/liveness/retry",
    tag = "Verification",
    request_body(content = EmailRequest, description = "Request Body"),
    responses(
        (status=200, description= "Capture re-armed", body= GenericResponse<SessionView>),
        (status=409, description= "Liveness has not failed", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(err, name = "Retry Liveness API", skip(controller), fields(email = %body.email))]
pub async fn retry_liveness(
    body: web::Json<EmailRequest>,
    controller: web::Data<VerificationController>,
) -> Result<web::Json<GenericResponse<SessionView>>, VerificationError> {
    let session = controller.retry_liveness(&body.email).await?;
    Ok(web::Json(GenericResponse::success(
        "Liveness capture restarted",
        Some(session),
    )))
}

#[utoipa::path(
    post,
    path = "/verification/otp/send",
    tag = "Verification",
    request_body(content = EmailRequest, description = "Request Body"),
    responses(
        (status=200, description= "OTP sent", body= GenericResponse<OtpDispatch>),
        (status=409, description= "Liveness not passed", body= GenericResponse<TupleUnit>),
        (status=500, description= "Mail delivery failed", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(err, name = "Send OTP API", skip(controller), fields(email = %body.email))]
pub async fn request_otp(
    body: web::Json<EmailRequest>,
    controller: web::Data<VerificationController>,
) -> Result<web::Json<GenericResponse<OtpDispatch>>, VerificationError> {
    let dispatch = controller.request_otp(&body.email).await?;
    Ok(web::Json(GenericResponse::success(
        "OTP sent successfully",
        Some(dispatch),
    )))
}

#[utoipa::path(
    post,
    path = "/verification/otp/resend",
    tag = "Verification",
    request_body(content = EmailRequest, description = "Request Body"),
    responses(
        (status=200, description= "OTP re-sent", body= GenericResponse<OtpDispatch>),
        (status=409, description= "No OTP can be resent in this stage", body= GenericResponse<TupleUnit>),
        (status=500, description= "Mail delivery failed", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(err, name = "Resend OTP API", skip(controller), fields(email = %body.email))]
pub async fn resend_otp(
    body: web::Json<EmailRequest>,
    controller: web::Data<VerificationController>,
) -> Result<web::Json<GenericResponse<OtpDispatch>>, VerificationError> {
    let dispatch = controller.resend_otp(&body.email).await?;
    Ok(web::Json(GenericResponse::success(
        "OTP resent successfully",
        Some(dispatch),
    )))
}

#[utoipa::path(
    post,
    path = "/verification/otp/verify",
    tag = "Verification",
    request_body(content = OtpVerifyRequest, description = "Request Body"),
    responses(
        (status=200, description= "OTP verified, or rejected with success=false", body= GenericResponse<SessionView>),
        (status=400, description= "Code is not six digits", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(err, name = "Verify OTP API", skip(controller, body), fields(email = %body.email))]
pub async fn verify_otp(
    body: web::Json<OtpVerifyRequest>,
    controller: web::Data<VerificationController>,
) -> Result<web::Json<GenericResponse<SessionView>>, VerificationError> {
    let session = controller.verify_otp(&body.email, &body.code).await?;
    Ok(web::Json(GenericResponse::success(
        "OTP verified successfully",
        Some(session),
    )))
}

#[utoipa::path(
    get,
    path = "/verification/session",
    tag = "Verification",
    params(SessionQuery),
    responses(
        (status=200, description= "Current session, or null data when none exists", body= GenericResponse<SessionView>),
    )
)]
#[tracing::instrument(name = "Fetch Session API", skip(controller), fields(email = %query.email))]
pub async fn get_session(
    query: web::Query<SessionQuery>,
    controller: web::Data<VerificationController>,
) -> web::Json<GenericResponse<SessionView>> {
    match controller.session(&query.email).await {
        Some(session) => web::Json(GenericResponse::success(
            "Fetched verification session",
            Some(session),
        )),
        None => web::Json(GenericResponse::success(
            "No verification session found",
            None,
        )),
    }
}
