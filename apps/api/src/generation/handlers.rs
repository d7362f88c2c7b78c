//! Axum route handlers for generation and download.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::generation::pipeline::{
    generate_deck, generate_word, DeckRequest, GeneratedFile, WordRequest,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub status: &'static str,
    pub message: String,
    pub data: GeneratedFile,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub filename: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /generate/ppt
pub async fn handle_generate_ppt(
    State(state): State<AppState>,
    Json(request): Json<DeckRequest>,
) -> Result<Json<GenerationResponse>, AppError> {
    let file = generate_deck(&state, request).await?;
    Ok(Json(GenerationResponse {
        status: "completed",
        message: format!("Presentation {} generated", file.filename),
        data: file,
    }))
}

/// POST /generate/word
pub async fn handle_generate_word(
    State(state): State<AppState>,
    Json(request): Json<WordRequest>,
) -> Result<Json<GenerationResponse>, AppError> {
    let file = generate_word(&state, request).await?;
    Ok(Json(GenerationResponse {
        status: "completed",
        message: format!("Document {} generated", file.filename),
        data: file,
    }))
}

/// GET /download?userID=&filename=
///
/// Returns the whole file as an attachment body, or 404 if it does not exist.
pub async fn handle_download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, AppError> {
    let path = state.placement.resolve_path(&query.user_id, &query.filename)?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!(
                "File {} not found for user {}",
                query.filename, query.user_id
            )));
        }
        Err(e) => return Err(AppError::Internal(e.into())),
    };

    info!("Serving {} ({} bytes)", path.display(), bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_LENGTH, bytes.len().to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&query.filename)),
        ],
        Bytes::from(bytes),
    )
        .into_response())
}

/// `attachment` header with an ASCII fallback name and an RFC 5987 UTF-8 name.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(filename.len() * 3);
    for byte in filename.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("f.pptx"),
            "attachment; filename=\"f.pptx\"; filename*=UTF-8''f.pptx"
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        let header = content_disposition("光合 作用.docx");
        assert!(header.starts_with("attachment; filename=\"__ __.docx\""));
        assert!(header.ends_with("filename*=UTF-8''%E5%85%89%E5%90%88%20%E4%BD%9C%E7%94%A8.docx"));
    }
}
