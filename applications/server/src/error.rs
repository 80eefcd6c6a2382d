/// Server error types
use crate::links::{Envelope, Links};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use encore_core::ValidationErrors;
use encore_storage::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Precondition failed: resource has been modified")]
    PreconditionFailed,

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<StorageError> for ServerError {
    fn from(err: StorageError) -> Self {
        match err {
            // A reference vanished between validation and the write
            StorageError::InvalidReference(missing) => {
                ServerError::Validation(ValidationErrors::from(missing))
            }
            other => ServerError::Storage(other),
        }
    }
}

/// Message of an error response, carried as a response extension so the
/// envelope middleware can rebuild the body with request-aware links.
#[derive(Debug, Clone)]
pub struct ErrorMessage(pub String);

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            ServerError::Storage(_) | ServerError::Internal(_) | ServerError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text shown to clients. Server-side faults are logged and hidden.
    fn public_message(&self) -> String {
        match self {
            ServerError::Storage(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            ServerError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            ServerError::Config(msg) => {
                tracing::error!("Config error: {}", msg);
                "Configuration error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.public_message();

        let mut response = (
            status,
            Json(Envelope::<()>::error(message.clone(), Links::new())),
        )
            .into_response();
        response.extensions_mut().insert(ErrorMessage(message));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_joined() {
        let mut errors = ValidationErrors::new();
        errors.push("Title is required");
        errors.push("Genre is required");
        let err = ServerError::from(errors);

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Title is required, Genre is required");
    }

    #[test]
    fn storage_details_are_hidden() {
        let err = ServerError::from(StorageError::Migration("boom".to_string()));

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Database error");
    }

    #[test]
    fn dangling_references_are_client_errors() {
        let err = ServerError::from(StorageError::InvalidReference(vec![
            "Album not found".to_string(),
            "Artist not found".to_string(),
        ]));

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Album not found, Artist not found");
    }

    #[test]
    fn response_carries_message_extension() {
        let response = ServerError::NotFound("Album not found".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let message = response.extensions().get::<ErrorMessage>().unwrap();
        assert_eq!(message.0, "Album not found");
    }
}
