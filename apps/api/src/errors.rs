use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::deck::DeckError;
use crate::llm_client::LlmError;
use crate::placement::PlacementError;
use crate::word::WordError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Slide deck error: {0}")]
    Deck(#[from] DeckError),

    #[error("Document error: {0}")]
    Word(#[from] WordError),

    #[error("Placement error: {0}")]
    Placement(#[from] PlacementError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Placement(e @ PlacementError::InvalidSegment(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    format!("Content generation failed: {e}"),
                )
            }
            AppError::Deck(e) => {
                tracing::error!("Slide deck error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DECK_ERROR",
                    format!("Could not build the presentation: {e}"),
                )
            }
            AppError::Word(e) => {
                tracing::error!("Document error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "WORD_ERROR",
                    format!("Could not build the document: {e}"),
                )
            }
            AppError::Placement(e) => {
                tracing::error!("Placement error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PLACEMENT_ERROR",
                    "Could not store the generated file".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (AppError::Llm(LlmError::EmptyContent), StatusCode::BAD_GATEWAY),
            (
                AppError::Placement(PlacementError::InvalidSegment("..".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Placement(PlacementError::SourceMissing("/tmp/x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::Deck(DeckError::invalid_template("broken")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
