use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::document_store::SubmittedDocument;
use crate::domain::{deserialize_email_object, EmailObject};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSubmitRequest {
    #[serde(deserialize_with = "deserialize_email_object")]
    #[schema(value_type = String, example = "a@x.com")]
    pub email: EmailObject,
    #[schema(example = "application/pdf")]
    pub content_type: String,
    /// Base64 encoded file contents.
    #[schema(value_type = String, format = Byte)]
    pub document: String,
}

impl std::fmt::Debug for DocumentSubmitRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSubmitRequest")
            .field("email", &self.email)
            .field("content_type", &self.content_type)
            .field("document_len", &self.document.len())
            .finish()
    }
}

impl DocumentSubmitRequest {
    pub fn decode(&self) -> Result<SubmittedDocument, String> {
        let bytes = BASE64
            .decode(self.document.trim())
            .map_err(|_| "Document is not valid base64".to_string())?;
        Ok(SubmittedDocument {
            content_type: self.content_type.trim().to_lowercase(),
            bytes,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReceipt {
    pub document_id: Uuid,
}
