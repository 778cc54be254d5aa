use actix_web::web;
use utoipa::TupleUnit;

use super::schemas::{DocumentReceipt, DocumentSubmitRequest};
use crate::schemas::GenericResponse;
use crate::verification::{VerificationController, VerificationError};

#[utoipa::path(
    post,
    path = "/document/submit",
    tag = "Document",
    request_body(content = DocumentSubmitRequest, description = "Request Body"),
    responses(
        (status=200, description= "Document stored", body= GenericResponse<DocumentReceipt>),
        (status=400, description= "Unsupported or undecodable document", body= GenericResponse<TupleUnit>),
        (status=403, description= "Verification not complete", body= GenericResponse<TupleUnit>),
        (status=409, description= "A document was already submitted", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(err, name = "Submit Document API", skip(controller), fields(email = %body.email))]
pub async fn submit_document(
    body: web::Json<DocumentSubmitRequest>,
    controller: web::Data<VerificationController>,
) -> Result<web::Json<GenericResponse<DocumentReceipt>>, VerificationError> {
    controller.authorize_protected_action(&body.email).await?;
    let document = body.decode().map_err(VerificationError::ValidationError)?;
    let document_id = controller.submit_document(&body.email, document).await?;
    Ok(web::Json(GenericResponse::success(
        "Document submitted successfully",
        Some(DocumentReceipt { document_id }),
    )))
}
