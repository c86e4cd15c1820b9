use crate::services::reaction::ReactionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Authentication failed")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// An opaque ID that does not decode under the expected connection.
    #[error("Invalid identifier")]
    InvalidIdentifier,

    #[error(transparent)]
    Reaction(#[from] ReactionError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::InvalidIdentifier => {
                (StatusCode::BAD_REQUEST, "Invalid identifier".to_string())
            }
            AppError::Reaction(e) => match e {
                ReactionError::UnsupportedTargetKind(kind) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    format!("Unsupported target kind '{kind}'"),
                ),
                ReactionError::TargetNotFound => {
                    (StatusCode::NOT_FOUND, "Target not found".to_string())
                }
                ReactionError::ReactionTypeNotFound => {
                    (StatusCode::NOT_FOUND, "Emotion not found".to_string())
                }
                // Already logged with full context by the reaction service.
                ReactionError::Persistence(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                ),
            },
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();
        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn invalid_identifier_is_client_error() {
        assert_eq!(status_of(AppError::InvalidIdentifier), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn reaction_errors_are_classified() {
        assert_eq!(
            status_of(ReactionError::UnsupportedTargetKind("widgets".into()).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(ReactionError::TargetNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ReactionError::ReactionTypeNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ReactionError::Persistence(sea_orm::DbErr::Custom("boom".into())).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_messages_are_distinct() {
        let (_, target) = AppError::from(ReactionError::TargetNotFound).status_and_message();
        let (_, emotion) =
            AppError::from(ReactionError::ReactionTypeNotFound).status_and_message();
        assert_ne!(target, emotion);
    }

    #[test]
    fn persistence_failure_hides_storage_detail() {
        let (_, message) = AppError::from(ReactionError::Persistence(sea_orm::DbErr::Custom(
            "relation \"emotionables\" does not exist".into(),
        )))
        .status_and_message();
        assert_eq!(message, "Database error");
    }
}
