use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Errors a request handler can answer with.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing, malformed or out-of-range request data.
    #[error("{0}")]
    InvalidInput(String),

    /// Missing, expired or invalid token, or a token for a user that no longer exists.
    #[error("{0}")]
    Unauthenticated(String),

    /// A unique field (the email) is already taken.
    #[error("{0}")]
    Conflict(String),

    /// The record does not exist or belongs to someone else.
    #[error("{0}")]
    NotFound(String),

    /// Storage or other internal failure.
    ///
    /// The inner error is logged on the server and never sent to the client.
    #[error("internal error: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn transaction_not_found() -> Self {
        Self::NotFound("Transaction not found".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<crate::store::StoreError> for AppError {
    fn from(e: crate::store::StoreError) -> Self {
        use crate::store::StoreError;
        match e {
            StoreError::DuplicateEmail => {
                AppError::Conflict("User with this email already exists".into())
            }
            other => AppError::Persistence(other.into()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Persistence(e) => {
                error!(error = ?e, "request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}
