//! Service error taxonomy and its HTTP rendering.

use crate::permission::Denial;
use crate::web::response::ApiResponse;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing input. The detail names the offending field.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Absent, or not visible to the caller. The two are never distinguished.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    /// Duplicate unique key.
    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }
}

/// Record-level refusals on complaints.
impl From<Denial> for ServiceError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::NotFound => Self::NotFound("Complaint not found".to_owned()),
            Denial::Forbidden => Self::Forbidden("Access denied".to_owned()),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);

        let detail = fields
            .first()
            .map(|(field, errs)| {
                let code = errs.first().map(|e| e.code.as_ref()).unwrap_or("invalid");
                format!("\"{}\" failed {} validation", field, code)
            })
            .unwrap_or_else(|| "Invalid request".to_owned());

        Self::Validation(detail)
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::Validation(detail) => ApiResponse::failure("Validation error", Some(detail.clone())),
            Self::Database(err) => {
                log::error!("Database failure: {}", err);
                ApiResponse::failure("Internal server error", None)
            }
            Self::Internal(err) => {
                log::error!("Internal failure: {}", err);
                ApiResponse::failure("Internal server error", None)
            }
            other => ApiResponse::failure(other.to_string(), None),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
