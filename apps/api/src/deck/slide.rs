// Rendered slide model: what the writer serialises into slide parts.

use serde::Serialize;

use crate::deck::template::PlaceholderInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
    Title,
    TableOfContents,
    BulletList,
    Paragraph,
    TitleParagraph,
    /// Content whose shape was not recognised, rendered as plain text.
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub kind: SlideKind,
    pub layout_index: usize,
    pub title: String,
    /// `None` when the layout has no title placeholder; the title is then not drawn.
    pub title_placeholder: Option<PlaceholderInfo>,
    /// `None` when the layout has no text placeholder; `paragraphs` is then empty.
    pub body_placeholder: Option<PlaceholderInfo>,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    pub title: String,
    pub slides: Vec<Slide>,
}

impl Deck {
    pub fn kinds(&self) -> Vec<SlideKind> {
        self.slides.iter().map(|s| s.kind).collect()
    }
}
