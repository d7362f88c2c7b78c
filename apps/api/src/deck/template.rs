//! Template Locator and slide-template introspection.
//!
//! The locator maps a design number to a `.pptx` path without touching the disk.
//! `DeckTemplate` loads that file (or the blank builder when it is absent) and
//! exposes the ordered slide layouts with their placeholders.

use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::DeckSettings;
use crate::deck::error::{DeckError, Result};
use crate::deck::skeleton;
use crate::package::Package;

const LAYOUT_PART_PREFIX: &str = "ppt/slideLayouts/slideLayout";

// ────────────────────────────────────────────────────────────────────────────
// Template Locator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
#[error("Unknown design {requested}; available designs: {available:?}")]
pub struct UnknownDesign {
    pub requested: u32,
    pub available: Vec<u32>,
}

/// Resolves design numbers to template paths. Existence is not checked here.
#[derive(Debug, Clone)]
pub struct TemplateLocator {
    designs_dir: PathBuf,
    file_format: String,
    available: Vec<u32>,
    default_design: u32,
}

impl TemplateLocator {
    pub fn new(settings: &DeckSettings) -> Self {
        Self {
            designs_dir: settings.designs_dir.clone(),
            file_format: settings.design_file_format.clone(),
            available: settings.available_designs.clone(),
            default_design: settings.default_design,
        }
    }

    pub fn is_known(&self, design: u32) -> bool {
        self.available.contains(&design)
    }

    /// Returns the template path for `design`, or for the configured default when `None`.
    pub fn resolve(&self, design: Option<u32>) -> std::result::Result<PathBuf, UnknownDesign> {
        let design = design.unwrap_or(self.default_design);
        if !self.is_known(design) {
            return Err(UnknownDesign {
                requested: design,
                available: self.available.clone(),
            });
        }
        let file_name = self.file_format.replace("{}", &design.to_string());
        Ok(self.designs_dir.join(file_name))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Layouts and placeholders
// ────────────────────────────────────────────────────────────────────────────

/// Placeholder types as they appear in the `type` attribute of `<p:ph>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    Title,
    CenterTitle,
    Subtitle,
    Body,
    Object,
    /// No `type` attribute; PowerPoint treats these as content placeholders.
    Untyped,
    DateTime,
    Footer,
    SlideNumber,
    Chart,
    Table,
    Diagram,
    Media,
    Picture,
    ClipArt,
    Other,
}

impl PlaceholderKind {
    pub fn from_ooxml(value: Option<&str>) -> Self {
        match value {
            None => Self::Untyped,
            Some("title") => Self::Title,
            Some("ctrTitle") => Self::CenterTitle,
            Some("subTitle") => Self::Subtitle,
            Some("body") => Self::Body,
            Some("obj") => Self::Object,
            Some("dt") => Self::DateTime,
            Some("ftr") => Self::Footer,
            Some("sldNum") => Self::SlideNumber,
            Some("chart") => Self::Chart,
            Some("tbl") => Self::Table,
            Some("dgm") => Self::Diagram,
            Some("media") => Self::Media,
            Some("pic") => Self::Picture,
            Some("clipArt") => Self::ClipArt,
            Some(_) => Self::Other,
        }
    }

    /// Value for the `type` attribute; `None` means the attribute is omitted.
    pub fn ooxml_type(self) -> Option<&'static str> {
        match self {
            Self::Title => Some("title"),
            Self::CenterTitle => Some("ctrTitle"),
            Self::Subtitle => Some("subTitle"),
            Self::Body => Some("body"),
            Self::Object => Some("obj"),
            Self::DateTime => Some("dt"),
            Self::Footer => Some("ftr"),
            Self::SlideNumber => Some("sldNum"),
            Self::Chart => Some("chart"),
            Self::Table => Some("tbl"),
            Self::Diagram => Some("dgm"),
            Self::Media => Some("media"),
            Self::Picture => Some("pic"),
            Self::ClipArt => Some("clipArt"),
            Self::Untyped | Self::Other => None,
        }
    }

    /// Whether body text can be placed in this placeholder.
    pub fn accepts_text(self) -> bool {
        matches!(
            self,
            Self::Subtitle | Self::Body | Self::Object | Self::Untyped | Self::Other
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderInfo {
    /// The `idx` attribute; defaults to 0 when absent.
    pub idx: u32,
    pub kind: PlaceholderKind,
}

impl PlaceholderInfo {
    pub fn new(idx: u32, kind: PlaceholderKind) -> Self {
        Self { idx, kind }
    }
}

/// One slide layout of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutInfo {
    /// 0-based position in the template's layout list.
    pub index: usize,
    pub name: String,
    /// Package part holding the layout, e.g. `ppt/slideLayouts/slideLayout2.xml`.
    pub part_name: String,
    pub placeholders: Vec<PlaceholderInfo>,
}

impl LayoutInfo {
    pub fn title_placeholder(&self) -> Option<PlaceholderInfo> {
        self.placeholders.iter().copied().find(|p| p.idx == 0)
    }

    /// The first non-title placeholder that accepts text.
    pub fn content_placeholder(&self) -> Option<PlaceholderInfo> {
        self.placeholders
            .iter()
            .copied()
            .find(|p| p.idx != 0 && p.kind.accepts_text())
    }

    /// Layouts usable for content slides carry both a title and a text placeholder.
    pub fn is_content_layout(&self) -> bool {
        self.title_placeholder().is_some() && self.content_placeholder().is_some()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// DeckTemplate
// ────────────────────────────────────────────────────────────────────────────

/// A loaded slide template: its layouts plus the package slides are written into.
#[derive(Debug, Clone)]
pub struct DeckTemplate {
    source: Option<PathBuf>,
    layouts: Vec<LayoutInfo>,
    package: Package,
}

impl DeckTemplate {
    /// Loads the template at `path`, or the blank builder if the file does not exist.
    ///
    /// A file that exists but cannot be read is an error.
    pub fn open_or_blank(path: &Path) -> Result<Self> {
        if path.exists() {
            let template = Self::load(path)?;
            info!(
                "Using template {} ({} layouts)",
                path.display(),
                template.layout_count()
            );
            Ok(template)
        } else {
            warn!(
                "Template {} does not exist; using the blank template",
                path.display()
            );
            Self::blank()
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let package = Package::open(path)?;
        let mut template = Self::from_package(package)?;
        template.source = Some(path.to_path_buf());
        Ok(template)
    }

    pub fn from_package(package: Package) -> Result<Self> {
        if !package.contains("ppt/presentation.xml") {
            return Err(DeckError::invalid_template(
                "package has no ppt/presentation.xml",
            ));
        }

        let mut numbered: Vec<(u32, String)> = package
            .part_names()
            .filter_map(|name| layout_number(name).map(|n| (n, name.to_string())))
            .collect();
        numbered.sort_by_key(|(n, _)| *n);

        let mut layouts = Vec::with_capacity(numbered.len());
        for (index, (_, part_name)) in numbered.into_iter().enumerate() {
            let xml = package.text(&part_name)?;
            layouts.push(parse_layout_xml(index, &part_name, &xml)?);
        }

        debug!("Template exposes {} layouts", layouts.len());

        Ok(Self {
            source: None,
            layouts,
            package,
        })
    }

    /// The built-in template with the eleven standard layouts.
    pub fn blank() -> Result<Self> {
        let layouts = skeleton::standard_layouts();
        let package = skeleton::build_package(&layouts);
        Ok(Self {
            source: None,
            layouts,
            package,
        })
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn is_blank(&self) -> bool {
        self.source.is_none()
    }

    pub fn layouts(&self) -> &[LayoutInfo] {
        &self.layouts
    }

    pub fn layout(&self, index: usize) -> Option<&LayoutInfo> {
        self.layouts.get(index)
    }

    pub fn layout_count(&self) -> usize {
        self.layouts.len()
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Indices of layouts usable for content slides. Layout 0 is reserved for the
    /// title slide and never included.
    pub fn content_layout_indices(&self) -> Vec<usize> {
        let indices: Vec<usize> = self
            .layouts
            .iter()
            .filter(|layout| layout.index != 0)
            .filter(|layout| {
                let usable = layout.is_content_layout();
                if !usable {
                    debug!(
                        "Layout {} ({}) lacks a title or text placeholder",
                        layout.index, layout.name
                    );
                }
                usable
            })
            .map(|layout| layout.index)
            .collect();
        debug!("Content layouts detected: {:?}", indices);
        indices
    }

    #[cfg(test)]
    pub fn from_layouts(layouts: Vec<LayoutInfo>) -> Self {
        let package = skeleton::build_package(&layouts);
        Self {
            source: None,
            layouts,
            package,
        }
    }
}

/// `ppt/slideLayouts/slideLayout12.xml` → `Some(12)`.
fn layout_number(part_name: &str) -> Option<u32> {
    part_name
        .strip_prefix(LAYOUT_PART_PREFIX)?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

fn parse_layout_xml(index: usize, part_name: &str, xml: &str) -> Result<LayoutInfo> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut name = format!("Layout {index}");
    let mut placeholders = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.name().as_ref() == b"p:cSld" =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"name" {
                        if let Ok(value) = std::str::from_utf8(&attr.value) {
                            name = value.to_string();
                        }
                    }
                }
            }
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.name().as_ref() == b"p:ph" =>
            {
                let mut kind = None;
                let mut idx = 0u32;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"type" => {
                            kind = std::str::from_utf8(&attr.value).ok().map(str::to_string);
                        }
                        b"idx" => {
                            if let Ok(value) = std::str::from_utf8(&attr.value) {
                                idx = value.parse().unwrap_or(0);
                            }
                        }
                        _ => {}
                    }
                }
                placeholders.push(PlaceholderInfo::new(
                    idx,
                    PlaceholderKind::from_ooxml(kind.as_deref()),
                ));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(DeckError::xml(part_name, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(LayoutInfo {
        index,
        name,
        part_name: part_name.to_string(),
        placeholders,
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn settings() -> DeckSettings {
        DeckSettings {
            designs_dir: PathBuf::from("/srv/designs"),
            ..DeckSettings::default()
        }
    }

    #[test]
    fn test_locator_formats_design_number() {
        let locator = TemplateLocator::new(&settings());
        assert_eq!(
            locator.resolve(Some(5)).unwrap(),
            PathBuf::from("/srv/designs/Design-5.pptx")
        );
    }

    #[test]
    fn test_locator_uses_default_design() {
        let locator = TemplateLocator::new(&settings());
        assert_eq!(
            locator.resolve(None).unwrap(),
            PathBuf::from("/srv/designs/Design-1.pptx")
        );
    }

    #[test]
    fn test_locator_rejects_unknown_design() {
        let locator = TemplateLocator::new(&settings());
        let err = locator.resolve(Some(42)).unwrap_err();
        assert_eq!(err.requested, 42);
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_layout_number_parsing() {
        assert_eq!(layout_number("ppt/slideLayouts/slideLayout12.xml"), Some(12));
        assert_eq!(layout_number("ppt/slideLayouts/_rels/slideLayout1.xml.rels"), None);
        assert_eq!(layout_number("ppt/slides/slide1.xml"), None);
    }

    #[test]
    fn test_parse_layout_xml_reads_name_and_placeholders() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="obj">
  <p:cSld name="Title and Content">
    <p:spTree>
      <p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr></p:sp>
      <p:sp><p:nvSpPr><p:cNvPr id="3" name="Content 2"/><p:cNvSpPr/><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr></p:sp>
      <p:sp><p:nvSpPr><p:cNvPr id="4" name="Date 3"/><p:cNvSpPr/><p:nvPr><p:ph type="dt" sz="half" idx="10"><p:extLst/></p:ph></p:nvPr></p:nvSpPr></p:sp>
    </p:spTree>
  </p:cSld>
</p:sldLayout>"#;
        let layout = parse_layout_xml(1, "ppt/slideLayouts/slideLayout2.xml", xml).unwrap();

        assert_eq!(layout.name, "Title and Content");
        assert_eq!(
            layout.placeholders,
            vec![
                PlaceholderInfo::new(0, PlaceholderKind::Title),
                PlaceholderInfo::new(1, PlaceholderKind::Untyped),
                PlaceholderInfo::new(10, PlaceholderKind::DateTime),
            ]
        );
        assert!(layout.is_content_layout());
    }

    #[test]
    fn test_footer_only_layout_is_not_content() {
        use PlaceholderKind::*;
        let layout = layout(2, &[(0, Title), (11, Footer), (12, SlideNumber)]);
        assert!(layout.title_placeholder().is_some());
        assert!(layout.content_placeholder().is_none());
        assert!(!layout.is_content_layout());
    }

    #[test]
    fn test_picture_placeholder_does_not_count_as_text() {
        use PlaceholderKind::*;
        let layout = layout(1, &[(0, Title), (1, Picture)]);
        assert!(!layout.is_content_layout());
    }

    #[test]
    fn test_content_layout_indices_skip_title_layout() {
        let template = four_layout_template();
        assert_eq!(template.content_layout_indices(), vec![1, 3]);
    }

    #[test]
    fn test_blank_template_has_standard_layouts() {
        let template = DeckTemplate::blank().unwrap();
        assert!(template.is_blank());
        assert_eq!(template.layout_count(), 11);
        assert_eq!(template.layout(0).unwrap().name, "Title Slide");
        assert_eq!(template.layout(1).unwrap().name, "Title and Content");
        // Title Only and Blank carry no text placeholder.
        let indices = template.content_layout_indices();
        assert!(indices.contains(&1));
        assert!(!indices.contains(&5));
        assert!(!indices.contains(&6));
    }

    #[test]
    fn test_blank_package_round_trips_through_loader() {
        let blank = DeckTemplate::blank().unwrap();
        let bytes = blank.package().to_bytes().unwrap();
        let reloaded = DeckTemplate::from_package(Package::from_bytes(&bytes).unwrap()).unwrap();

        assert_eq!(reloaded.layouts(), blank.layouts());
    }

    #[test]
    fn test_open_or_blank_falls_back_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let template = DeckTemplate::open_or_blank(&dir.path().join("Design-9.pptx")).unwrap();
        assert!(template.is_blank());
    }

    #[test]
    fn test_open_or_blank_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Design-1.pptx");
        std::fs::write(&path, b"not a zip").unwrap();
        assert!(DeckTemplate::open_or_blank(&path).is_err());
    }

    #[test]
    fn test_load_from_disk_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Design-2.pptx");
        DeckTemplate::blank()
            .unwrap()
            .package()
            .save(&path)
            .unwrap();

        let template = DeckTemplate::open_or_blank(&path).unwrap();
        assert_eq!(template.source(), Some(path.as_path()));
        assert_eq!(template.layout_count(), 11);
    }
}
