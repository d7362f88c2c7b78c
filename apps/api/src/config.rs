use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Completion endpoint settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Slide-deck pipeline settings.
#[derive(Debug, Clone)]
pub struct DeckSettings {
    pub designs_dir: PathBuf,
    /// File name format for a design template; `{}` is replaced by the design number.
    pub design_file_format: String,
    pub available_designs: Vec<u32>,
    pub default_design: u32,
    pub default_expected_slides: u32,
    pub use_random_layouts: bool,
    pub auto_detect_layouts: bool,
    /// Allow-list used when `auto_detect_layouts` is off.
    pub content_layouts: Vec<usize>,
}

impl Default for DeckSettings {
    fn default() -> Self {
        Self {
            designs_dir: PathBuf::from("Designs"),
            design_file_format: "Design-{}.pptx".to_string(),
            available_designs: vec![1, 2, 3, 4, 5, 6, 7],
            default_design: 1,
            default_expected_slides: 4,
            use_random_layouts: true,
            auto_detect_layouts: true,
            content_layouts: vec![1, 2, 3, 4, 7, 8, 9],
        }
    }
}

/// Word-document pipeline settings.
#[derive(Debug, Clone)]
pub struct WordSettings {
    pub template_path: PathBuf,
}

impl Default for WordSettings {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from("templates/lesson_template.docx"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmSettings,
    pub deck: DeckSettings,
    pub word: WordSettings,
    pub output_root: PathBuf,
    /// Parent directory for per-request scratch directories. `None` means the system temp dir.
    pub scratch_dir: Option<PathBuf>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let deck_defaults = DeckSettings::default();
        let word_defaults = WordSettings::default();

        Ok(Config {
            llm: LlmSettings {
                base_url: require_env("OPENAI_BASE_URL")?,
                api_key: std::env::var("OPENAI_API_KEY").unwrap_or_else(|_| "dummy_key".to_string()),
                model: require_env("MODEL_NAME")?,
                temperature: parse_env("LLM_TEMPERATURE", 0.7)?,
                timeout_secs: parse_env("LLM_TIMEOUT_SECS", 120)?,
            },
            deck: DeckSettings {
                designs_dir: std::env::var("DESIGNS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(deck_defaults.designs_dir),
                design_file_format: std::env::var("DESIGN_FILE_FORMAT")
                    .unwrap_or(deck_defaults.design_file_format),
                available_designs: parse_list_env(
                    "AVAILABLE_DESIGNS",
                    deck_defaults.available_designs,
                )?,
                default_design: parse_env("DEFAULT_DESIGN_NUMBER", deck_defaults.default_design)?,
                default_expected_slides: parse_env(
                    "DEFAULT_EXPECTED_SLIDES",
                    deck_defaults.default_expected_slides,
                )?,
                use_random_layouts: parse_env(
                    "USE_RANDOM_LAYOUTS",
                    deck_defaults.use_random_layouts,
                )?,
                auto_detect_layouts: parse_env(
                    "AUTO_DETECT_LAYOUTS",
                    deck_defaults.auto_detect_layouts,
                )?,
                content_layouts: parse_list_env("CONTENT_LAYOUTS", deck_defaults.content_layouts)?,
            },
            word: WordSettings {
                template_path: std::env::var("WORD_TEMPLATE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(word_defaults.template_path),
            },
            output_root: std::env::var("OUTPUT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("Output")),
            scratch_dir: std::env::var("SCRATCH_DIR").ok().map(PathBuf::from),
            port: parse_env("PORT", 8000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

#[cfg(test)]
impl Config {
    /// Configuration rooted in `dir`. Neither the designs directory nor the word
    /// template exists, so both pipelines use their blank builders.
    pub fn for_tests(dir: &std::path::Path) -> Self {
        Config {
            llm: LlmSettings {
                base_url: "http://127.0.0.1:9".to_string(),
                api_key: "test".to_string(),
                model: "test-model".to_string(),
                temperature: 0.7,
                timeout_secs: 5,
            },
            deck: DeckSettings {
                designs_dir: dir.join("designs"),
                ..DeckSettings::default()
            },
            word: WordSettings {
                template_path: dir.join("templates").join("lesson_template.docx"),
            },
            output_root: dir.join("Output"),
            scratch_dir: Some(dir.to_path_buf()),
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn parse_list_env<T>(key: &str, default: Vec<T>) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_list(&raw).with_context(|| format!("{key} must be a comma-separated list")),
        Err(_) => Ok(default),
    }
}

/// Parses `"1, 2,3"` into `[1, 2, 3]`. Empty items are skipped, so `""` yields an empty list.
fn parse_list<T>(raw: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<T>()
                .with_context(|| format!("invalid list item '{item}'"))
        })
        .collect()
}
