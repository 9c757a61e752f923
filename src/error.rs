use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::users::repo::StoreError;
use crate::users::validation::FieldErrors;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid request")]
    Validation(FieldErrors),

    #[error("user not found with id {0}")]
    NotFound(i64),

    #[error("email already in use: {0}")]
    DuplicateEmail(String),

    #[error("store unavailable: {0}")]
    Store(#[source] anyhow::Error),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail(email) => Self::DuplicateEmail(email),
            StoreError::Missing(id) => Self::NotFound(id),
            StoreError::Backend(e) => Self::Store(e),
        }
    }
}

impl From<FieldErrors> for ServiceError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::Validation(fields) => {
                tracing::warn!(?fields, "validation failed");
                (StatusCode::BAD_REQUEST, Json(fields)).into_response()
            }
            ServiceError::NotFound(id) => {
                tracing::warn!(id, "user not found");
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": format!("User not found with id {id}") })),
                )
                    .into_response()
            }
            ServiceError::DuplicateEmail(email) => {
                tracing::warn!(%email, "duplicate email");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("Email already in use: {email}") })),
                )
                    .into_response()
            }
            ServiceError::Store(e) => {
                tracing::error!(error = ?e, "store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}
