//! Template context for lesson worksheets.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::content::extract_json_object;
use crate::content::model::coerce_text;

pub const DEFAULT_TOPIC: &str = "Unspecified topic";
pub const DEFAULT_WORKSHEET_TITLE: &str = "Worksheet";
pub const DEFAULT_DOCUMENT_NAME: &str = "document";

/// Every field a worksheet template may reference.
///
/// List entries are kept as JSON values so templates can reach into structured
/// items such as `{{ q.question }}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordContext {
    pub theme: String,
    pub topic: String,
    pub learning_focus: String,
    pub learning_outcome: String,
    pub teaching_suggestions: Vec<Value>,
    pub worksheet_title: String,
    pub quiz_data: Vec<Value>,
    pub answer: String,
    pub multiple_choice: Vec<Value>,
    pub short_answer_questions: Vec<Value>,
    /// Generation date, `YYYY-MM-DD`.
    pub today: String,
}

impl WordContext {
    pub fn from_value(value: &Value, today: NaiveDate) -> Self {
        let empty = Map::new();
        let obj = value.as_object().unwrap_or(&empty);

        Self {
            theme: text_or(obj, "theme", DEFAULT_TOPIC),
            topic: text_or(obj, "topic", DEFAULT_TOPIC),
            learning_focus: text_or(obj, "learning_focus", ""),
            learning_outcome: text_or(obj, "learning_outcome", ""),
            teaching_suggestions: list(obj, "teaching_suggestions"),
            worksheet_title: text_or(obj, "worksheet_title", DEFAULT_WORKSHEET_TITLE),
            quiz_data: list(obj, "quiz_data"),
            answer: text_or(obj, "answer", ""),
            multiple_choice: list(obj, "multiple_choice"),
            short_answer_questions: list(obj, "short_answer_questions"),
            today: today.format("%Y-%m-%d").to_string(),
        }
    }

    /// Label/value pairs in template order, used by the blank document builder.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let join = |items: &[Value]| {
            items
                .iter()
                .map(coerce_text)
                .collect::<Vec<_>>()
                .join("\n")
        };
        vec![
            ("Theme", self.theme.clone()),
            ("Topic", self.topic.clone()),
            ("Learning focus", self.learning_focus.clone()),
            ("Learning outcome", self.learning_outcome.clone()),
            ("Teaching suggestions", join(&self.teaching_suggestions)),
            ("Quiz", join(&self.quiz_data)),
            ("Answers", self.answer.clone()),
            ("Multiple choice", join(&self.multiple_choice)),
            ("Short answer questions", join(&self.short_answer_questions)),
            ("Date", self.today.clone()),
        ]
    }
}

/// Parsed model output for the document path.
#[derive(Debug, Clone, PartialEq)]
pub struct WordContent {
    pub context: WordContext,
    /// Suggested file name from the model, if any.
    pub filename: Option<String>,
    pub degraded: bool,
}

impl WordContent {
    /// Parses model output. Unparseable output yields an all-defaults context.
    pub fn from_raw(raw: &str, today: NaiveDate) -> Self {
        match extract_json_object(raw) {
            Some(value) => Self {
                context: WordContext::from_value(&value, today),
                filename: value
                    .get("filename")
                    .filter(|v| !v.is_null())
                    .map(coerce_text)
                    .filter(|s| !s.trim().is_empty()),
                degraded: false,
            },
            None => {
                warn!("Worksheet content could not be parsed; using defaults");
                Self {
                    context: WordContext::from_value(&Value::Null, today),
                    filename: None,
                    degraded: true,
                }
            }
        }
    }

    /// Output name without extension: custom, then suggested, then theme, then a fixed default.
    pub fn output_stem(&self, custom: Option<&str>) -> String {
        custom
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| self.filename.clone())
            .or_else(|| {
                Some(self.context.theme.clone()).filter(|t| !t.trim().is_empty() && !self.degraded)
            })
            .unwrap_or_else(|| DEFAULT_DOCUMENT_NAME.to_string())
    }
}

fn text_or(obj: &Map<String, Value>, key: &str, default: &str) -> String {
    obj.get(key)
        .filter(|v| !v.is_null())
        .map(coerce_text)
        .unwrap_or_else(|| default.to_string())
}

fn list(obj: &Map<String, Value>, key: &str) -> Vec<Value> {
    match obj.get(key) {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other.clone()],
    }
}
