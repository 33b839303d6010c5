use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::model::RequestStatus;

/// Failures of the time-off workflow, each mapped to one HTTP status.
#[derive(Debug, Error)]
pub enum AppError {
    /// malformed or missing input
    #[error("{0}")]
    Validation(String),
    /// no caller identity
    #[error("{0}")]
    Authentication(String),
    /// caller identity present, role insufficient
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    NotFound(String),
    /// request already resolved to a different status
    #[error("Request is already marked as {}.", .current.label().to_string().to_lowercase())]
    InvalidTransition { current: RequestStatus },
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("identity provider failure: {0}")]
    Identity(String),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Persistence(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        AppError::Persistence(e.to_string())
    }
}

/// `{ ok: false, error }` envelope used by every failing endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = false)]
    pub ok: bool,
    #[schema(example = "Request not found.")]
    pub error: String,
}

impl AppError {
    /// Message safe to show to the end user.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Persistence(_) | AppError::Identity(_) => {
                "Something went wrong, Contact with system admin".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::Persistence(_) | AppError::Identity(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!(error = %self, "Request failed");
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            ok: false,
            error: self.public_message(),
        })
    }
}

pub type AppResult<T> = Result<T, AppError>;
