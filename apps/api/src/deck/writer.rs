//! Serialises an assembled `Deck` into a copy of the template package.
//!
//! Slides are appended after any slides the template already carries. For each
//! slide the writer adds the slide part, its relationship to the layout, a
//! presentation relationship, an `sldIdLst` entry and a content-type override.

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::info;

use crate::deck::error::{DeckError, Result};
use crate::deck::skeleton::{
    group_shape_props, placeholder_element, rels_part_for, CT_SLIDE, NS_A, NS_P, NS_PKG_RELS,
    NS_R, REL_SLIDE, REL_SLIDE_LAYOUT,
};
use crate::deck::slide::{Deck, Slide};
use crate::deck::template::{DeckTemplate, PlaceholderInfo};
use crate::package::{escape_xml, Package};

const CONTENT_TYPES: &str = "[Content_Types].xml";
const PRESENTATION: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";
const SLIDE_PREFIX: &str = "ppt/slides/slide";

/// Smallest id PowerPoint accepts in `sldIdLst`.
const MIN_SLIDE_ID: u32 = 256;

/// Writes `deck` into a copy of the template package and saves it at `path`.
pub fn save_deck(template: &DeckTemplate, deck: &Deck, path: &Path) -> Result<()> {
    let package = write_deck(template, deck)?;
    package.save(path)?;
    info!("Saved {} slides to {}", deck.slides.len(), path.display());
    Ok(())
}

pub fn write_deck(template: &DeckTemplate, deck: &Deck) -> Result<Package> {
    let mut package = template.package().clone();

    let mut content_types = package.text(CONTENT_TYPES)?;
    let mut presentation = package.text(PRESENTATION)?;
    let mut presentation_rels = package.text(PRESENTATION_RELS)?;

    let mut next_slide_number = next_slide_number(&package);
    let mut next_rel_id = max_rel_id(&presentation_rels)? + 1;
    let mut next_slide_id = max_slide_id(&presentation)?.max(MIN_SLIDE_ID - 1) + 1;

    let mut overrides = String::new();
    let mut relationships = String::new();
    let mut slide_ids = String::new();

    for slide in &deck.slides {
        let layout = template
            .layout(slide.layout_index)
            .ok_or_else(|| DeckError::LayoutRender {
                index: slide.layout_index,
                section: "slide",
                reason: "layout missing while writing".to_string(),
            })?;

        let part_name = format!("{SLIDE_PREFIX}{next_slide_number}.xml");
        package.set(part_name.clone(), slide_xml(slide));
        package.set(
            rels_part_for(&part_name),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{NS_PKG_RELS}"><Relationship Id="rId1" Type="{REL_SLIDE_LAYOUT}" Target="{}"/></Relationships>"#,
                relative_target(&layout.part_name)
            ),
        );

        overrides.push_str(&format!(
            r#"<Override PartName="/{part_name}" ContentType="{CT_SLIDE}"/>"#
        ));
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{next_rel_id}" Type="{REL_SLIDE}" Target="slides/slide{next_slide_number}.xml"/>"#
        ));
        slide_ids.push_str(&format!(
            r#"<p:sldId id="{next_slide_id}" r:id="rId{next_rel_id}"/>"#
        ));

        next_slide_number += 1;
        next_rel_id += 1;
        next_slide_id += 1;
    }

    insert_before(&mut content_types, "</Types>", &overrides, CONTENT_TYPES)?;
    insert_before(
        &mut presentation_rels,
        "</Relationships>",
        &relationships,
        PRESENTATION_RELS,
    )?;
    insert_slide_ids(&mut presentation, &slide_ids)?;

    package.set(CONTENT_TYPES, content_types);
    package.set(PRESENTATION, presentation);
    package.set(PRESENTATION_RELS, presentation_rels);

    Ok(package)
}

fn slide_xml(slide: &Slide) -> String {
    let mut shapes = String::new();
    let mut shape_id = 2;

    if let Some(ph) = slide.title_placeholder {
        shapes.push_str(&placeholder_shape(
            shape_id,
            "Title",
            ph,
            std::slice::from_ref(&slide.title),
        ));
        shape_id += 1;
    }
    if let Some(ph) = slide.body_placeholder {
        shapes.push_str(&placeholder_shape(shape_id, "Content", ph, &slide.paragraphs));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:spTree>{}{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        group_shape_props()
    )
}

fn placeholder_shape(id: u32, label: &str, ph: PlaceholderInfo, paragraphs: &[String]) -> String {
    let mut body = String::new();
    for text in paragraphs {
        body.push_str(&paragraph_xml(text));
    }
    if body.is_empty() {
        body.push_str(r#"<a:p><a:endParaRPr lang="en-US"/></a:p>"#);
    }
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{label} {}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>{}</p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{body}</p:txBody></p:sp>"#,
        id - 1,
        placeholder_element(ph)
    )
}

/// One `<a:p>`; embedded newlines become line breaks within the paragraph.
fn paragraph_xml(text: &str) -> String {
    if text.is_empty() {
        return r#"<a:p><a:endParaRPr lang="en-US"/></a:p>"#.to_string();
    }
    let runs: Vec<String> = text
        .split('\n')
        .map(|line| {
            format!(
                r#"<a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r>"#,
                escape_xml(line.trim_end_matches('\r'))
            )
        })
        .collect();
    format!(
        r#"<a:p>{}</a:p>"#,
        runs.join(r#"<a:br><a:rPr lang="en-US" dirty="0"/></a:br>"#)
    )
}

/// Target of a relationship from `ppt/slides/` to another part.
fn relative_target(part_name: &str) -> String {
    match part_name.strip_prefix("ppt/") {
        Some(rest) => format!("../{rest}"),
        None => format!("/{part_name}"),
    }
}

fn next_slide_number(package: &Package) -> u32 {
    package
        .part_names()
        .filter_map(|name| {
            name.strip_prefix(SLIDE_PREFIX)?
                .strip_suffix(".xml")?
                .parse::<u32>()
                .ok()
        })
        .max()
        .unwrap_or(0)
        + 1
}

/// Highest numeric `rIdN` in a relationships part; 0 if none.
fn max_rel_id(rels_xml: &str) -> Result<u32> {
    let mut max = 0;
    for_each_element(rels_xml, PRESENTATION_RELS, b"Relationship", b"Id", |value| {
        if let Some(n) = value.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()) {
            max = max.max(n);
        }
    })?;
    Ok(max)
}

/// Highest `id` in `sldIdLst`; 0 if the list is empty or absent.
fn max_slide_id(presentation_xml: &str) -> Result<u32> {
    let mut max = 0;
    for_each_element(presentation_xml, PRESENTATION, b"p:sldId", b"id", |value| {
        if let Ok(n) = value.parse::<u32>() {
            max = max.max(n);
        }
    })?;
    Ok(max)
}

/// Calls `f` with the value of `attr` on every `element` in `xml`.
fn for_each_element(
    xml: &str,
    part: &str,
    element: &[u8],
    attr: &[u8],
    mut f: impl FnMut(&str),
) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.name().as_ref() == element => {
                for a in e.attributes().flatten() {
                    if a.key.as_ref() == attr {
                        if let Ok(value) = std::str::from_utf8(&a.value) {
                            f(value);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(DeckError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

fn insert_before(xml: &mut String, marker: &str, insertion: &str, part: &str) -> Result<()> {
    let pos = xml
        .rfind(marker)
        .ok_or_else(|| DeckError::invalid_template(format!("{part} has no {marker}")))?;
    xml.insert_str(pos, insertion);
    Ok(())
}

/// Adds entries to `sldIdLst`, creating the list in schema order if absent.
fn insert_slide_ids(presentation: &mut String, slide_ids: &str) -> Result<()> {
    if slide_ids.is_empty() {
        return Ok(());
    }
    if presentation.contains("</p:sldIdLst>") {
        return insert_before(presentation, "</p:sldIdLst>", slide_ids, PRESENTATION);
    }
    let list = format!("<p:sldIdLst>{slide_ids}</p:sldIdLst>");
    if presentation.contains("<p:sldIdLst/>") {
        *presentation = presentation.replacen("<p:sldIdLst/>", &list, 1);
        return Ok(());
    }
    // sldIdLst precedes sldSz, which precedes the mandatory notesSz.
    for marker in ["<p:sldSz", "<p:notesSz"] {
        if let Some(pos) = presentation.find(marker) {
            presentation.insert_str(pos, &list);
            return Ok(());
        }
    }
    Err(DeckError::invalid_template(
        "ppt/presentation.xml has no place for sldIdLst",
    ))
}
