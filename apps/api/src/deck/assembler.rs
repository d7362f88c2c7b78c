//! Document Assembler for slide decks.
//!
//! Walks `ParsedContent` in order and produces one `Slide` per section. A table of
//! contents is inserted right after the first title section when any slide entry
//! was tagged `content`. Content sections take their layout from the `LayoutSelector`
//! and are retried once with the fallback layout if that layout cannot render them.

use tracing::{debug, warn};

use crate::content::{ParsedContent, SectionSpec};
use crate::deck::error::{DeckError, Result};
use crate::deck::layout::{LayoutSelector, FALLBACK_LAYOUT};
use crate::deck::slide::{Deck, Slide, SlideKind};
use crate::deck::template::{DeckTemplate, LayoutInfo};

pub const TITLE_LAYOUT: usize = 0;
pub const TOC_LAYOUT: usize = 1;
pub const TOC_TITLE: &str = "Contents";

pub struct DeckAssembler<'a> {
    template: &'a DeckTemplate,
    selector: &'a LayoutSelector,
}

impl<'a> DeckAssembler<'a> {
    pub fn new(template: &'a DeckTemplate, selector: &'a LayoutSelector) -> Self {
        Self { template, selector }
    }

    pub fn assemble(&self, content: &ParsedContent) -> Result<Deck> {
        let toc_entries = table_of_contents(content);
        let mut toc_pending = !toc_entries.is_empty();
        let mut slides = Vec::with_capacity(content.sections.len() + 1);

        for section in &content.sections {
            if let SectionSpec::Title { title, subtitle } = section {
                slides.push(self.title_slide(title, subtitle)?);
                if toc_pending {
                    slides.push(self.toc_slide(toc_entries)?);
                    toc_pending = false;
                }
            } else {
                slides.push(self.content_slide(section)?);
            }
        }

        debug!("Assembled {} slides for '{}'", slides.len(), content.title);

        Ok(Deck {
            title: content.title.clone(),
            slides,
        })
    }

    fn layout(&self, index: usize, section: &'static str) -> Result<&LayoutInfo> {
        self.template
            .layout(index)
            .ok_or_else(|| DeckError::LayoutRender {
                index,
                section,
                reason: format!(
                    "template has only {} layouts",
                    self.template.layout_count()
                ),
            })
    }

    fn title_slide(&self, title: &str, subtitle: &str) -> Result<Slide> {
        let layout = self.layout(TITLE_LAYOUT, "title")?;
        let body_placeholder = layout.content_placeholder();
        if body_placeholder.is_none() {
            warn!("Title layout has no subtitle placeholder; subtitle dropped");
        }
        Ok(Slide {
            kind: SlideKind::Title,
            layout_index: TITLE_LAYOUT,
            title: title.to_string(),
            title_placeholder: layout.title_placeholder(),
            body_placeholder,
            paragraphs: body_placeholder
                .map(|_| vec![subtitle.to_string()])
                .unwrap_or_default(),
        })
    }

    fn toc_slide(&self, entries: &[String]) -> Result<Slide> {
        let layout = self.layout(TOC_LAYOUT, "table_of_contents")?;
        let paragraphs = entries
            .iter()
            .enumerate()
            .map(|(i, title)| format!("{}. {}", i + 1, title))
            .collect();
        Ok(fill(layout, SlideKind::TableOfContents, TOC_TITLE, paragraphs))
    }

    fn content_slide(&self, section: &SectionSpec) -> Result<Slide> {
        let selected = self.selector.select(self.template);
        debug!("Layout {} selected for '{}'", selected, section.title());

        match self.render_section(section, selected) {
            Ok(slide) => Ok(slide),
            Err(err) if selected != FALLBACK_LAYOUT => {
                warn!("{}; retrying with layout {}", err, FALLBACK_LAYOUT);
                self.render_section(section, FALLBACK_LAYOUT)
            }
            Err(err) => Err(err),
        }
    }

    fn render_section(&self, section: &SectionSpec, layout_index: usize) -> Result<Slide> {
        let layout = self.layout(layout_index, section.kind_name())?;
        let (kind, paragraphs) = match section {
            SectionSpec::BulletList { items, .. } => (SlideKind::BulletList, items.clone()),
            SectionSpec::Paragraph { text, .. } => (SlideKind::Paragraph, vec![text.clone()]),
            SectionSpec::TitleParagraph { label, body, .. } => {
                (SlideKind::TitleParagraph, vec![label.clone(), body.clone()])
            }
            SectionSpec::Unknown { text, .. } => (SlideKind::Text, vec![text.clone()]),
            SectionSpec::Title { .. } => {
                return Err(DeckError::LayoutRender {
                    index: layout_index,
                    section: "title",
                    reason: "title sections use the title layout".to_string(),
                })
            }
        };
        Ok(fill(layout, kind, section.title(), paragraphs))
    }
}

/// Places `paragraphs` in the layout's text placeholder, or drops them if it has none.
fn fill(layout: &LayoutInfo, kind: SlideKind, title: &str, paragraphs: Vec<String>) -> Slide {
    let body_placeholder = layout.content_placeholder();
    let paragraphs = match body_placeholder {
        Some(_) => paragraphs,
        None => {
            warn!(
                "Layout {} ({}) has no text placeholder; '{}' rendered without content",
                layout.index, layout.name, title
            );
            Vec::new()
        }
    };
    Slide {
        kind,
        layout_index: layout.index,
        title: title.to_string(),
        title_placeholder: layout.title_placeholder(),
        body_placeholder,
        paragraphs,
    }
}

/// Entries of the contents slide, in input order.
pub fn table_of_contents(content: &ParsedContent) -> &[String] {
    &content.contents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::layout::LayoutPolicy;
    use crate::deck::template::test_support::{four_layout_template, layout};
    use crate::deck::template::PlaceholderKind;

    fn content(sections: Vec<SectionSpec>) -> ParsedContent {
        ParsedContent {
            title: "Deck".to_string(),
            filename: "deck".to_string(),
            contents: sections
                .iter()
                .filter(|s| !matches!(s, SectionSpec::Title { .. }))
                .map(|s| s.title().to_string())
                .collect(),
            sections,
            degraded: false,
        }
    }

    fn title() -> SectionSpec {
        SectionSpec::Title {
            title: "Main".to_string(),
            subtitle: "Sub".to_string(),
        }
    }

    fn bullets(title: &str, items: &[&str]) -> SectionSpec {
        SectionSpec::BulletList {
            title: title.to_string(),
            items: items.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn paragraph(title: &str, text: &str) -> SectionSpec {
        SectionSpec::Paragraph {
            title: title.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_toc_inserted_after_title() {
        let template = DeckTemplate::blank().unwrap();
        let selector = LayoutSelector::new(LayoutPolicy::AutoDetect);
        let deck = DeckAssembler::new(&template, &selector)
            .assemble(&content(vec![
                title(),
                bullets("A", &["x"]),
                paragraph("B", "text"),
            ]))
            .unwrap();

        assert_eq!(
            deck.kinds(),
            vec![
                SlideKind::Title,
                SlideKind::TableOfContents,
                SlideKind::BulletList,
                SlideKind::Paragraph
            ]
        );
        let toc = &deck.slides[1];
        assert_eq!(toc.title, "Contents");
        assert_eq!(toc.layout_index, TOC_LAYOUT);
        assert_eq!(toc.paragraphs, vec!["1. A", "2. B"]);
        assert_eq!(deck.slides[2].title, "A");
        assert_eq!(deck.slides[3].title, "B");
    }

    #[test]
    fn test_toc_skips_sections_not_tagged_content() {
        let template = DeckTemplate::blank().unwrap();
        let selector = LayoutSelector::new(LayoutPolicy::Fixed);
        let parsed = ParsedContent::from_value(&serde_json::json!({
            "slides": [
                {"type": "title", "title": "Deck", "subtitle": "S"},
                {"type": "content", "content": ["x"]},
                {"type": "section", "title": "Break", "content": ["y"]},
                {"type": "content", "title": "Wrap-up", "content": ["z"]}
            ]
        }));
        let deck = DeckAssembler::new(&template, &selector)
            .assemble(&parsed)
            .unwrap();

        assert_eq!(deck.slides.len(), 5);
        assert_eq!(deck.slides[1].kind, SlideKind::TableOfContents);
        assert_eq!(deck.slides[1].paragraphs, vec!["1. Part 2", "2. Wrap-up"]);
        assert_eq!(deck.slides[3].title, "Break");
    }

    #[test]
    fn test_no_toc_without_content_sections() {
        let template = DeckTemplate::blank().unwrap();
        let selector = LayoutSelector::new(LayoutPolicy::AutoDetect);
        let deck = DeckAssembler::new(&template, &selector)
            .assemble(&ParsedContent::fallback())
            .unwrap();

        assert_eq!(deck.kinds(), vec![SlideKind::Title]);
        assert_eq!(deck.slides[0].title, "Title");
        assert_eq!(deck.slides[0].paragraphs, vec!["Subtitle"]);
    }

    #[test]
    fn test_only_first_title_gets_a_toc() {
        let template = DeckTemplate::blank().unwrap();
        let selector = LayoutSelector::new(LayoutPolicy::Fixed);
        let deck = DeckAssembler::new(&template, &selector)
            .assemble(&content(vec![title(), bullets("A", &["x"]), title()]))
            .unwrap();

        assert_eq!(
            deck.kinds(),
            vec![
                SlideKind::Title,
                SlideKind::TableOfContents,
                SlideKind::BulletList,
                SlideKind::Title
            ]
        );
    }

    #[test]
    fn test_content_before_title_keeps_input_order() {
        let template = DeckTemplate::blank().unwrap();
        let selector = LayoutSelector::new(LayoutPolicy::Fixed);
        let deck = DeckAssembler::new(&template, &selector)
            .assemble(&content(vec![paragraph("Intro", "t"), title()]))
            .unwrap();

        assert_eq!(
            deck.kinds(),
            vec![
                SlideKind::Paragraph,
                SlideKind::Title,
                SlideKind::TableOfContents
            ]
        );
    }

    #[test]
    fn test_section_rendering_rules() {
        let template = DeckTemplate::blank().unwrap();
        let selector = LayoutSelector::new(LayoutPolicy::Fixed);
        let deck = DeckAssembler::new(&template, &selector)
            .assemble(&content(vec![
                bullets("List", &["one", "two", "three"]),
                paragraph("Para", "body"),
                SectionSpec::TitleParagraph {
                    title: "TP".to_string(),
                    label: "Why".to_string(),
                    body: "Because".to_string(),
                },
                SectionSpec::Unknown {
                    title: "Odd".to_string(),
                    text: r#"{"k":1}"#.to_string(),
                },
            ]))
            .unwrap();

        assert_eq!(deck.slides[0].paragraphs, vec!["one", "two", "three"]);
        assert_eq!(deck.slides[1].paragraphs, vec!["body"]);
        assert_eq!(deck.slides[2].paragraphs, vec!["Why", "Because"]);
        assert_eq!(deck.slides[3].kind, SlideKind::Text);
        assert_eq!(deck.slides[3].paragraphs, vec![r#"{"k":1}"#]);
    }

    #[test]
    fn test_selected_layouts_come_from_eligible_set() {
        let template = four_layout_template();
        let selector = LayoutSelector::new(LayoutPolicy::AutoDetect);
        let sections: Vec<_> = (0..50).map(|i| paragraph(&format!("S{i}"), "t")).collect();
        let deck = DeckAssembler::new(&template, &selector)
            .assemble(&content(sections))
            .unwrap();

        assert!(deck
            .slides
            .iter()
            .all(|s| s.layout_index == 1 || s.layout_index == 3));
    }

    #[test]
    fn test_out_of_range_layout_retries_with_fallback() {
        let template = four_layout_template();
        let selector = LayoutSelector::new(LayoutPolicy::Configured(vec![9]));
        let assembler = DeckAssembler::new(&template, &selector);

        let err = assembler.render_section(&paragraph("P", "t"), 9).unwrap_err();
        assert!(matches!(err, DeckError::LayoutRender { index: 9, .. }));

        let slide = assembler.content_slide(&paragraph("P", "t")).unwrap();
        assert_eq!(slide.layout_index, FALLBACK_LAYOUT);
        assert_eq!(slide.paragraphs, vec!["t"]);
    }

    #[test]
    fn test_fallback_failure_is_fatal() {
        use PlaceholderKind::*;
        // Only a title layout: layout 1 does not exist.
        let template = DeckTemplate::from_layouts(vec![layout(0, &[(0, CenterTitle), (1, Subtitle)])]);
        let selector = LayoutSelector::new(LayoutPolicy::AutoDetect);
        let err = DeckAssembler::new(&template, &selector)
            .assemble(&content(vec![paragraph("P", "t")]))
            .unwrap_err();
        assert!(matches!(err, DeckError::LayoutRender { index: 1, .. }));
    }

    #[test]
    fn test_layout_without_text_placeholder_keeps_title_only() {
        use PlaceholderKind::*;
        let template = DeckTemplate::from_layouts(vec![
            layout(0, &[(0, CenterTitle), (1, Subtitle)]),
            layout(1, &[(0, Title), (11, Footer)]),
        ]);
        let selector = LayoutSelector::new(LayoutPolicy::Fixed);
        let deck = DeckAssembler::new(&template, &selector)
            .assemble(&content(vec![bullets("Only title", &["lost"])]))
            .unwrap();

        assert_eq!(deck.slides[0].title, "Only title");
        assert!(deck.slides[0].body_placeholder.is_none());
        assert!(deck.slides[0].paragraphs.is_empty());
    }
}
