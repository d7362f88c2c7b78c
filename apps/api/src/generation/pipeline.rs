//! Generation pipelines.
//!
//! Flow: validate → prompt → completion → parse → assemble (blocking pool) →
//!       write into a per-request scratch dir → place under the user's directory.
//!
//! The scratch directory is removed when the blocking task finishes, whether or
//! not placement succeeded.

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tracing::{info, warn};

use crate::config::Config;
use crate::content::parse_content;
use crate::content::prompts::{build_deck_prompt, DECK_SYSTEM};
use crate::deck::{save_deck, DeckAssembler, DeckTemplate, SlideKind};
use crate::errors::AppError;
use crate::llm_client::{ChatMessage, Completion};
use crate::placement::{sanitize_file_stem, validate_segment};
use crate::state::AppState;
use crate::word::prompts::{build_worksheet_prompt, WORKSHEET_SYSTEM};
use crate::word::{WordContent, WordRenderer};

// ────────────────────────────────────────────────────────────────────────────
// Request / result types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct DeckRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub content: String,
    pub expected_slides: Option<u32>,
    pub design_number: Option<u32>,
    pub custom_filename: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WordRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub learning_content: String,
    pub user_requirements: Option<String>,
    pub custom_filename: Option<String>,
}

/// A placed output file.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedFile {
    #[serde(rename = "fullPath")]
    pub full_path: PathBuf,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub filename: String,
    /// Model output was unusable and defaults were rendered instead.
    pub degraded: bool,
    /// Slide sequence, for decks only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slides: Option<Vec<SlideKind>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Slide deck
// ────────────────────────────────────────────────────────────────────────────

pub async fn generate_deck(state: &AppState, request: DeckRequest) -> Result<GeneratedFile, AppError> {
    let user_id = validate_segment(&request.user_id)?.to_string();
    if request.content.trim().is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }
    let expected_slides = request
        .expected_slides
        .unwrap_or(state.config.deck.default_expected_slides);
    if expected_slides == 0 {
        return Err(AppError::Validation(
            "expected_slides must be at least 1".to_string(),
        ));
    }
    let template_path = state
        .templates
        .resolve(request.design_number)
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let custom_stem = custom_stem(request.custom_filename.as_deref())?;

    info!(
        "Generating deck for user {} ({} slides, template {})",
        user_id,
        expected_slides,
        template_path.display()
    );

    let messages = [
        ChatMessage::system(DECK_SYSTEM),
        ChatMessage::user(build_deck_prompt(&request.content, expected_slides)),
    ];
    let completion = complete(state, &messages).await?;

    let parsed = parse_content(&completion.text);
    if parsed.degraded {
        warn!("Deck content for user {} degraded to the fallback", user_id);
    }

    let stem = custom_stem
        .or_else(|| sanitize_file_stem(&parsed.filename))
        .unwrap_or_else(|| crate::content::model::DEFAULT_FILENAME.to_string());
    let filename = format!("{stem}.pptx");

    let config = state.config.clone();
    let layouts = state.layouts.clone();
    let placement = state.placement.clone();
    let degraded = parsed.degraded;

    let (full_path, kinds) = tokio::task::spawn_blocking(move || -> Result<_, AppError> {
        let template = DeckTemplate::open_or_blank(&template_path)?;
        let deck = DeckAssembler::new(&template, &layouts).assemble(&parsed)?;

        let scratch = scratch_dir(&config)?;
        let scratch_path = scratch.path().join(&filename);
        save_deck(&template, &deck, &scratch_path)?;

        let placed = placement.place(&scratch_path, &user_id, &filename)?;
        Ok((placed, deck.kinds()))
    })
    .await
    .map_err(|e| AppError::Internal(anyhow!("deck task failed: {e}")))??;

    info!("Deck ready at {}", full_path.display());

    Ok(GeneratedFile {
        filename: file_name_of(&full_path),
        full_path,
        user_id: request.user_id,
        degraded,
        slides: Some(kinds),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Word document
// ────────────────────────────────────────────────────────────────────────────

pub async fn generate_word(state: &AppState, request: WordRequest) -> Result<GeneratedFile, AppError> {
    let user_id = validate_segment(&request.user_id)?.to_string();
    if request.learning_content.trim().is_empty() {
        return Err(AppError::Validation(
            "learning_content cannot be empty".to_string(),
        ));
    }
    let custom_stem = custom_stem(request.custom_filename.as_deref())?;

    info!("Generating document for user {}", user_id);

    let messages = [
        ChatMessage::system(WORKSHEET_SYSTEM),
        ChatMessage::user(build_worksheet_prompt(
            &request.learning_content,
            request.user_requirements.as_deref(),
        )),
    ];
    let completion = complete(state, &messages).await?;

    let content = WordContent::from_raw(&completion.text, Local::now().date_naive());
    let stem = sanitize_file_stem(&content.output_stem(custom_stem.as_deref()))
        .unwrap_or_else(|| crate::word::context::DEFAULT_DOCUMENT_NAME.to_string());
    let filename = format!("{stem}.docx");

    let config = state.config.clone();
    let placement = state.placement.clone();
    let degraded = content.degraded;

    let full_path = tokio::task::spawn_blocking(move || -> Result<_, AppError> {
        let scratch = scratch_dir(&config)?;
        let scratch_path = scratch.path().join(&filename);
        WordRenderer::new().render_to_file(
            &config.word.template_path,
            &content.context,
            &scratch_path,
        )?;
        Ok(placement.place(&scratch_path, &user_id, &filename)?)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow!("document task failed: {e}")))??;

    info!("Document ready at {}", full_path.display());

    Ok(GeneratedFile {
        filename: file_name_of(&full_path),
        full_path,
        user_id: request.user_id,
        degraded,
        slides: None,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn complete(state: &AppState, messages: &[ChatMessage]) -> Result<Completion, AppError> {
    let completion = state
        .llm
        .complete(&state.config.llm.model, messages)
        .await?;
    info!(
        "Completion received: {} prompt + {} completion tokens",
        completion.usage.prompt_tokens, completion.usage.completion_tokens
    );
    Ok(completion)
}

/// A caller-supplied name must survive sanitising; an unusable one is rejected.
fn custom_stem(custom: Option<&str>) -> Result<Option<String>, AppError> {
    match custom.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(name) => sanitize_file_stem(name).map(Some).ok_or_else(|| {
            AppError::Validation(format!("custom_filename '{name}' is not a usable file name"))
        }),
    }
}

fn scratch_dir(config: &Config) -> anyhow::Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("docgen-");
    match &config.scratch_dir {
        Some(dir) => builder
            .tempdir_in(dir)
            .with_context(|| format!("could not create scratch directory in {}", dir.display())),
        None => builder.tempdir().context("could not create scratch directory"),
    }
}

fn file_name_of(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::llm_client::{CompletionClient, LlmError, Usage};
    use crate::package::Package;

    const SAMPLE_DECK: &str = r#"{"title":"T","filename":"f","slides":[{"type":"title","title":"T","subtitle":"S"},{"type":"content","title":"P1","content_type":"bullet_list","content":["a","b"]}]}"#;

    /// Replays a fixed response and records the prompts it was sent.
    struct FakeClient {
        response: Result<String, u16>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl FakeClient {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                response: Err(status),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for FakeClient {
        async fn complete(
            &self,
            _model: &str,
            messages: &[ChatMessage],
        ) -> Result<Completion, LlmError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            match &self.response {
                Ok(text) => Ok(Completion {
                    text: text.clone(),
                    usage: Usage::default(),
                }),
                Err(status) => Err(LlmError::Api {
                    status: *status,
                    message: "upstream down".to_string(),
                }),
            }
        }
    }

    fn deck_request(user_id: &str) -> DeckRequest {
        DeckRequest {
            user_id: user_id.to_string(),
            content: "Teach me P1".to_string(),
            expected_slides: Some(3),
            design_number: None,
            custom_filename: None,
        }
    }

    #[tokio::test]
    async fn test_deck_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeClient::replying(SAMPLE_DECK);
        let state = AppState::new(Config::for_tests(dir.path()), client.clone());

        let file = generate_deck(&state, deck_request("u1")).await.unwrap();

        assert_eq!(file.full_path, dir.path().join("Output").join("u1").join("f.pptx"));
        assert_eq!(file.filename, "f.pptx");
        assert!(!file.degraded);
        assert_eq!(
            file.slides.as_deref(),
            Some(&[SlideKind::Title, SlideKind::TableOfContents, SlideKind::BulletList][..])
        );

        let package = Package::open(&file.full_path).unwrap();
        let toc = package.text("ppt/slides/slide2.xml").unwrap();
        assert!(toc.contains("<a:t>1. P1</a:t>"));
        let bullets = package.text("ppt/slides/slide3.xml").unwrap();
        assert!(bullets.contains("<a:t>a</a:t>") && bullets.contains("<a:t>b</a:t>"));

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0][1].content.contains("Teach me P1"));
    }

    #[tokio::test]
    async fn test_scratch_directory_is_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(Config::for_tests(dir.path()), FakeClient::replying(SAMPLE_DECK));

        generate_deck(&state, deck_request("u1")).await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with("docgen-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_output_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(
            Config::for_tests(dir.path()),
            FakeClient::replying("I cannot help with that."),
        );

        let mut request = deck_request("u1");
        request.custom_filename = Some("mine".to_string());
        let file = generate_deck(&state, request).await.unwrap();

        assert!(file.degraded);
        assert_eq!(file.filename, "mine.pptx");
        assert_eq!(file.slides, Some(vec![SlideKind::Title]));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_llm_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(Config::for_tests(dir.path()), FakeClient::failing(503));

        let err = generate_deck(&state, deck_request("u1")).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(LlmError::Api { status: 503, .. })));
        assert!(!dir.path().join("Output").join("u1").exists());
    }

    #[tokio::test]
    async fn test_request_validation() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeClient::replying(SAMPLE_DECK);
        let state = AppState::new(Config::for_tests(dir.path()), client.clone());

        let mut unknown_design = deck_request("u1");
        unknown_design.design_number = Some(99);
        assert!(matches!(
            generate_deck(&state, unknown_design).await,
            Err(AppError::Validation(_))
        ));

        assert!(matches!(
            generate_deck(&state, deck_request("../etc")).await,
            Err(AppError::Placement(_))
        ));

        let mut zero = deck_request("u1");
        zero.expected_slides = Some(0);
        assert!(matches!(generate_deck(&state, zero).await, Err(AppError::Validation(_))));

        let mut bad_name = deck_request("u1");
        bad_name.custom_filename = Some("..".to_string());
        assert!(matches!(
            generate_deck(&state, bad_name).await,
            Err(AppError::Validation(_))
        ));

        // Validation happens before any completion call.
        assert!(client.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_llm_filename_is_sanitised() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(
            Config::for_tests(dir.path()),
            FakeClient::replying(r#"{"title":"T","filename":"a/b: c","slides":[]}"#),
        );
        let file = generate_deck(&state, deck_request("u1")).await.unwrap();
        assert_eq!(file.filename, "a_b_ c.pptx");
        assert!(file.slides.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_word_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeClient::replying(
            r#"Here you go: {"theme": "Plants", "worksheet_title": "Leaves", "filename": "plants_ws"}"#,
        );
        let state = AppState::new(Config::for_tests(dir.path()), client.clone());

        let file = generate_word(
            &state,
            WordRequest {
                user_id: "u2".to_string(),
                learning_content: "Photosynthesis".to_string(),
                user_requirements: Some("Grade 4".to_string()),
                custom_filename: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(file.full_path, dir.path().join("Output").join("u2").join("plants_ws.docx"));
        assert!(!file.degraded);
        assert!(file.slides.is_none());

        let package = Package::open(&file.full_path).unwrap();
        assert!(package.text("word/document.xml").unwrap().contains("Leaves"));

        let seen = client.seen.lock().unwrap();
        assert!(seen[0][1].content.contains("Grade 4"));
    }

    #[tokio::test]
    async fn test_word_degraded_uses_default_name() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(Config::for_tests(dir.path()), FakeClient::replying("nope"));

        let file = generate_word(
            &state,
            WordRequest {
                user_id: "u2".to_string(),
                learning_content: "Photosynthesis".to_string(),
                user_requirements: None,
                custom_filename: None,
            },
        )
        .await
        .unwrap();

        assert!(file.degraded);
        assert_eq!(file.filename, "document.docx");
    }
}
