//! Content model: the typed view of the JSON a model returns for a slide deck.
//!
//! Conversion from `serde_json::Value` is total: every shape maps to *some*
//! `ParsedContent`. Missing fields take defaults; malformed sections become
//! `SectionSpec::Unknown` with their payload stringified.

use serde::Serialize;
use serde_json::{Map, Value};

pub const DEFAULT_DECK_TITLE: &str = "Presentation";
pub const DEFAULT_FILENAME: &str = "presentation";
pub const DEFAULT_SECTION_TITLE: &str = "Title";
pub const DEFAULT_SUBTITLE: &str = "Subtitle";

/// One unit of content destined for one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionSpec {
    Title {
        title: String,
        subtitle: String,
    },
    BulletList {
        title: String,
        items: Vec<String>,
    },
    Paragraph {
        title: String,
        text: String,
    },
    TitleParagraph {
        title: String,
        label: String,
        body: String,
    },
    /// Unrecognised content type, or a known tag with a payload of the wrong shape.
    Unknown {
        title: String,
        text: String,
    },
}

impl SectionSpec {
    pub fn title(&self) -> &str {
        match self {
            SectionSpec::Title { title, .. }
            | SectionSpec::BulletList { title, .. }
            | SectionSpec::Paragraph { title, .. }
            | SectionSpec::TitleParagraph { title, .. }
            | SectionSpec::Unknown { title, .. } => title,
        }
    }

    /// Short label used in logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SectionSpec::Title { .. } => "title",
            SectionSpec::BulletList { .. } => "bullet_list",
            SectionSpec::Paragraph { .. } => "paragraph",
            SectionSpec::TitleParagraph { .. } => "title_paragraph",
            SectionSpec::Unknown { .. } => "unknown",
        }
    }

    /// Maps one entry of the `slides` array.
    ///
    /// `position` is the 1-based index of the entry, used for the default title of
    /// content sections that arrive without one.
    pub fn from_value(value: &Value, position: usize) -> Self {
        let Some(obj) = value.as_object() else {
            return SectionSpec::Unknown {
                title: format!("Part {position}"),
                text: coerce_text(value),
            };
        };

        let slide_type = obj.get("type").and_then(Value::as_str).unwrap_or("content");
        if slide_type == "title" {
            return SectionSpec::Title {
                title: string_field(obj, "title").unwrap_or_else(|| DEFAULT_SECTION_TITLE.to_string()),
                subtitle: string_field(obj, "subtitle").unwrap_or_else(|| DEFAULT_SUBTITLE.to_string()),
            };
        }

        let title = string_field(obj, "title").unwrap_or_else(|| DEFAULT_SECTION_TITLE.to_string());
        let content_type = obj
            .get("content_type")
            .and_then(Value::as_str)
            .unwrap_or("bullet_list");
        let payload = obj.get("content").cloned().unwrap_or(Value::Array(Vec::new()));

        match (content_type, payload) {
            ("bullet_list", Value::Array(items)) => SectionSpec::BulletList {
                title,
                items: items.iter().map(coerce_text).collect(),
            },
            ("paragraph", payload) => SectionSpec::Paragraph {
                title,
                text: coerce_text(&payload),
            },
            ("title_paragraph", Value::Object(inner)) => SectionSpec::TitleParagraph {
                title,
                label: string_field(&inner, "subtitle").unwrap_or_default(),
                body: string_field(&inner, "text").unwrap_or_default(),
            },
            (_, payload) => SectionSpec::Unknown {
                title,
                text: coerce_text(&payload),
            },
        }
    }
}

/// Structured content for a deck, plus whether it came from the fallback path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedContent {
    pub title: String,
    pub filename: String,
    pub sections: Vec<SectionSpec>,
    /// Table-of-contents entries: one per slide explicitly tagged `content`, titled
    /// `Part {n}` when the slide has no title.
    pub contents: Vec<String>,
    /// True when the model output could not be parsed and the fixed fallback was used.
    pub degraded: bool,
}

impl ParsedContent {
    /// Builds content from an already-parsed JSON document. Never fails.
    pub fn from_value(value: &Value) -> Self {
        let empty = Map::new();
        let obj = value.as_object().unwrap_or(&empty);
        let slides = obj.get("slides").and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();

        let mut sections = Vec::with_capacity(slides.len());
        let mut contents = Vec::new();
        for (i, slide) in slides.iter().enumerate() {
            let position = i + 1;
            if let Some(entry) = contents_entry(slide, position) {
                contents.push(entry);
            }
            sections.push(SectionSpec::from_value(slide, position));
        }

        Self {
            title: string_field(obj, "title").unwrap_or_else(|| DEFAULT_DECK_TITLE.to_string()),
            filename: string_field(obj, "filename").unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
            sections,
            contents,
            degraded: false,
        }
    }

    /// The fixed structure used when model output is unusable: one title section.
    pub fn fallback() -> Self {
        Self {
            title: DEFAULT_DECK_TITLE.to_string(),
            filename: DEFAULT_FILENAME.to_string(),
            sections: vec![SectionSpec::Title {
                title: DEFAULT_SECTION_TITLE.to_string(),
                subtitle: DEFAULT_SUBTITLE.to_string(),
            }],
            contents: Vec::new(),
            degraded: true,
        }
    }
}

/// Renders any JSON value as slide text. Strings are taken as-is; `null` is empty.
pub fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn contents_entry(slide: &Value, position: usize) -> Option<String> {
    let obj = slide.as_object()?;
    if obj.get("type").and_then(Value::as_str) != Some("content") {
        return None;
    }
    Some(string_field(obj, "title").unwrap_or_else(|| format!("Part {position}")))
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).filter(|v| !v.is_null()).map(coerce_text)
}
