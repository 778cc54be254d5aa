use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct GenericResponse<D> {
    pub success: bool,
    pub message: String,
    pub code: String,
    pub data: Option<D>,
}

impl<D> GenericResponse<D> {
    // Associated function for creating a success response
    pub fn success(message: &str, data: Option<D>) -> Self {
        Self {
            success: true,
            message: String::from(message),
            code: String::from("200"),
            data,
        }
    }

    // Associated function for creating an error response
    pub fn error(message: &str, code: &str, data: Option<D>) -> Self {
        Self {
            success: false,
            message: String::from(message),
            code: String::from(code),
            data,
        }
    }
}
