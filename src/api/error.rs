use actix_web::{http::StatusCode, HttpResponse, ResponseError};

use super::models::{ApiResponse, ErrorDetail};
use crate::accounts::LoginError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Login(#[from] LoginError),
    #[error("internal database error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Login(LoginError::Database(_)) | ApiError::Database(_) => "internal",
            ApiError::Login(_) => "login_failed",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Login(LoginError::Database(_)) | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Login(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = if self.status_code().is_server_error() {
            tracing::error!(error = ?self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        let field = match self {
            ApiError::Login(e) => Some(e.field().to_string()),
            _ => None,
        };
        HttpResponse::build(self.status_code()).json(ApiResponse::<()>::error(ErrorDetail {
            code: self.code().to_string(),
            message,
            field,
        }))
    }
}
