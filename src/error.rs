use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::db::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("User already exists")]
    AlreadyExists,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        AppError::InvalidInput(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::InvalidInput(_) | AppError::AlreadyExists => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage(ref e) => {
                error!("Request failed on storage: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Empty search results answer with `message`, everything else with `error`
        let body = match self {
            AppError::NotFound(message) => json!({ "message": message }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
