use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::preprocess::ValidationError;
use crate::session::SessionError;
use crate::storage::StorageError;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Malformed upload: {0}")]
    Multipart(#[from] actix_multipart::MultipartError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ResponseError for UploadError {
    fn status_code(&self) -> StatusCode {
        match self {
            UploadError::Validation(ValidationError::FileTooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            UploadError::Validation(_) | UploadError::Multipart(_) => StatusCode::BAD_REQUEST,
            UploadError::Storage(_) | UploadError::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            UploadError::Storage(_) | UploadError::Session(_) => {
                log::error!("Error processing upload: {}", self);
                format!("Error processing upload: {}", self)
            }
            _ => self.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse { error: message })
    }
}
