//! Minimal presentation package used when no design template is available.
//!
//! Produces the eleven standard layouts PowerPoint ships with its default
//! template, one slide master, and a theme. Geometry is left to the master.

use crate::deck::template::{LayoutInfo, PlaceholderInfo, PlaceholderKind};
use crate::package::{escape_xml, Package};

pub(crate) const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const NS_R: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
pub(crate) const NS_PKG_RELS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

pub(crate) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
pub(crate) const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub(crate) const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub(crate) const REL_THEME: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";

pub(crate) const CT_PRESENTATION: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
pub(crate) const CT_SLIDE_MASTER: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
pub(crate) const CT_SLIDE_LAYOUT: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
pub(crate) const CT_SLIDE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
pub(crate) const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// The standard layout set, in PowerPoint's order.
pub fn standard_layouts() -> Vec<LayoutInfo> {
    use PlaceholderKind::*;

    let footer = [(10, DateTime), (11, Footer), (12, SlideNumber)];
    let table: [(&str, Vec<(u32, PlaceholderKind)>); 11] = [
        ("Title Slide", vec![(0, CenterTitle), (1, Subtitle)]),
        ("Title and Content", vec![(0, Title), (1, Untyped)]),
        ("Section Header", vec![(0, Title), (1, Body)]),
        ("Two Content", vec![(0, Title), (1, Untyped), (2, Untyped)]),
        (
            "Comparison",
            vec![(0, Title), (1, Body), (2, Untyped), (3, Body), (4, Untyped)],
        ),
        ("Title Only", vec![(0, Title)]),
        ("Blank", vec![]),
        ("Content with Caption", vec![(0, Title), (1, Untyped), (2, Body)]),
        ("Picture with Caption", vec![(0, Title), (1, Picture), (2, Body)]),
        ("Title and Vertical Text", vec![(0, Title), (1, Body)]),
        ("Vertical Title and Text", vec![(0, Title), (1, Body)]),
    ];

    table
        .into_iter()
        .enumerate()
        .map(|(index, (name, placeholders))| LayoutInfo {
            index,
            name: name.to_string(),
            part_name: format!("ppt/slideLayouts/slideLayout{}.xml", index + 1),
            placeholders: placeholders
                .into_iter()
                .chain(footer)
                .map(|(idx, kind)| PlaceholderInfo::new(idx, kind))
                .collect(),
        })
        .collect()
}

/// Builds a package containing `layouts` and no slides.
pub fn build_package(layouts: &[LayoutInfo]) -> Package {
    let mut package = Package::new();

    package.set("[Content_Types].xml", content_types(layouts));
    package.set(
        "_rels/.rels",
        format!(
            r#"{XML_DECL}<Relationships xmlns="{NS_PKG_RELS}"><Relationship Id="rId1" Type="{REL_OFFICE_DOCUMENT}" Target="ppt/presentation.xml"/></Relationships>"#
        ),
    );
    package.set("ppt/presentation.xml", presentation());
    package.set(
        "ppt/_rels/presentation.xml.rels",
        format!(
            r#"{XML_DECL}<Relationships xmlns="{NS_PKG_RELS}"><Relationship Id="rId1" Type="{REL_SLIDE_MASTER}" Target="slideMasters/slideMaster1.xml"/><Relationship Id="rId2" Type="{REL_THEME}" Target="theme/theme1.xml"/></Relationships>"#
        ),
    );
    package.set("ppt/slideMasters/slideMaster1.xml", slide_master(layouts));
    package.set(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        slide_master_rels(layouts),
    );
    package.set("ppt/theme/theme1.xml", THEME);

    for layout in layouts {
        package.set(layout.part_name.clone(), slide_layout(layout));
        package.set(
            rels_part_for(&layout.part_name),
            format!(
                r#"{XML_DECL}<Relationships xmlns="{NS_PKG_RELS}"><Relationship Id="rId1" Type="{REL_SLIDE_MASTER}" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#
            ),
        );
    }

    package
}

/// `ppt/slides/slide1.xml` → `ppt/slides/_rels/slide1.xml.rels`.
pub(crate) fn rels_part_for(part_name: &str) -> String {
    match part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part_name}.rels"),
    }
}

fn content_types(layouts: &[LayoutInfo]) -> String {
    let mut xml = format!(
        r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="{CT_PRESENTATION}"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="{CT_SLIDE_MASTER}"/><Override PartName="/ppt/theme/theme1.xml" ContentType="{CT_THEME}"/>"#
    );
    for layout in layouts {
        xml.push_str(&format!(
            r#"<Override PartName="/{}" ContentType="{CT_SLIDE_LAYOUT}"/>"#,
            layout.part_name
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn presentation() -> String {
    format!(
        r#"{XML_DECL}<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldSz cx="9144000" cy="6858000" type="screen4x3"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
    )
}

fn slide_master(layouts: &[LayoutInfo]) -> String {
    let mut layout_ids = String::new();
    for (i, _) in layouts.iter().enumerate() {
        layout_ids.push_str(&format!(
            r#"<p:sldLayoutId id="{}" r:id="rId{}"/>"#,
            2_147_483_649u64 + i as u64,
            i + 1
        ));
    }

    format!(
        r#"{XML_DECL}<p:sldMaster xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>{group}{title}{body}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst>{layout_ids}</p:sldLayoutIdLst><p:txStyles><p:titleStyle><a:lvl1pPr algn="ctr"><a:defRPr sz="4400"/></a:lvl1pPr></p:titleStyle><p:bodyStyle><a:lvl1pPr marL="342900" indent="-342900"><a:buChar char="&#8226;"/><a:defRPr sz="2800"/></a:lvl1pPr></p:bodyStyle><p:otherStyle><a:lvl1pPr><a:defRPr/></a:lvl1pPr></p:otherStyle></p:txStyles></p:sldMaster>"#,
        group = group_shape_props(),
        title = master_shape(2, "Title Placeholder 1", "title", None, (457200, 274638, 8229600, 1143000)),
        body = master_shape(3, "Text Placeholder 2", "body", Some(1), (457200, 1600200, 8229600, 4525963)),
    )
}

fn slide_master_rels(layouts: &[LayoutInfo]) -> String {
    let mut xml = format!(r#"{XML_DECL}<Relationships xmlns="{NS_PKG_RELS}">"#);
    for (i, layout) in layouts.iter().enumerate() {
        let file = layout
            .part_name
            .rsplit_once('/')
            .map_or(layout.part_name.as_str(), |(_, f)| f);
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{REL_SLIDE_LAYOUT}" Target="../slideLayouts/{file}"/>"#,
            i + 1
        ));
    }
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="{REL_THEME}" Target="../theme/theme1.xml"/></Relationships>"#,
        layouts.len() + 1
    ));
    xml
}

fn slide_layout(layout: &LayoutInfo) -> String {
    let mut shapes = String::new();
    for (i, ph) in layout.placeholders.iter().enumerate() {
        let id = i + 2;
        let name = format!("{} {}", placeholder_label(ph.kind), id - 1);
        shapes.push_str(&format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>{ph}</p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#,
            ph = placeholder_element(*ph),
        ));
    }

    format!(
        r#"{XML_DECL}<p:sldLayout xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" preserve="1"><p:cSld name="{name}"><p:spTree>{group}{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        name = escape_xml(&layout.name),
        group = group_shape_props(),
    )
}

/// `<p:ph .../>` for a placeholder; `idx` is omitted when it is 0.
pub(crate) fn placeholder_element(ph: PlaceholderInfo) -> String {
    let mut attrs = String::new();
    if let Some(kind) = ph.kind.ooxml_type() {
        attrs.push_str(&format!(r#" type="{kind}""#));
    }
    if ph.idx != 0 {
        attrs.push_str(&format!(r#" idx="{}""#, ph.idx));
    }
    format!("<p:ph{attrs}/>")
}

pub(crate) fn group_shape_props() -> &'static str {
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
}

fn master_shape(
    id: u32,
    name: &str,
    kind: &str,
    idx: Option<u32>,
    (x, y, cx, cy): (u64, u64, u64, u64),
) -> String {
    let idx = idx.map(|i| format!(r#" idx="{i}""#)).unwrap_or_default();
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="{kind}"{idx}/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#
    )
}

fn placeholder_label(kind: PlaceholderKind) -> &'static str {
    match kind {
        PlaceholderKind::Title | PlaceholderKind::CenterTitle => "Title",
        PlaceholderKind::Subtitle => "Subtitle",
        PlaceholderKind::Body => "Text Placeholder",
        PlaceholderKind::DateTime => "Date Placeholder",
        PlaceholderKind::Footer => "Footer Placeholder",
        PlaceholderKind::SlideNumber => "Slide Number Placeholder",
        PlaceholderKind::Picture => "Picture Placeholder",
        _ => "Content Placeholder",
    }
}

const THEME: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements><a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F497D"/></a:dk2><a:lt2><a:srgbClr val="EEECE1"/></a:lt2><a:accent1><a:srgbClr val="4F81BD"/></a:accent1><a:accent2><a:srgbClr val="C0504D"/></a:accent2><a:accent3><a:srgbClr val="9BBB59"/></a:accent3><a:accent4><a:srgbClr val="8064A2"/></a:accent4><a:accent5><a:srgbClr val="4BACC6"/></a:accent5><a:accent6><a:srgbClr val="F79646"/></a:accent6><a:hlink><a:srgbClr val="0000FF"/></a:hlink><a:folHlink><a:srgbClr val="800080"/></a:folHlink></a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="25400"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="38100"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout_names_and_parts() {
        let layouts = standard_layouts();
        assert_eq!(layouts.len(), 11);
        assert_eq!(layouts[6].name, "Blank");
        assert_eq!(layouts[10].part_name, "ppt/slideLayouts/slideLayout11.xml");
    }

    #[test]
    fn test_title_slide_subtitle_is_its_content_placeholder() {
        let layouts = standard_layouts();
        let ph = layouts[0].content_placeholder().unwrap();
        assert_eq!(ph, PlaceholderInfo::new(1, PlaceholderKind::Subtitle));
    }

    #[test]
    fn test_build_package_has_required_parts() {
        let layouts = standard_layouts();
        let package = build_package(&layouts);
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/_rels/presentation.xml.rels",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            "ppt/theme/theme1.xml",
            "ppt/slideLayouts/slideLayout1.xml",
            "ppt/slideLayouts/_rels/slideLayout11.xml.rels",
        ] {
            assert!(package.contains(part), "missing {part}");
        }

        let types = package.text("[Content_Types].xml").unwrap();
        assert!(types.contains("/ppt/slideLayouts/slideLayout11.xml"));
    }

    #[test]
    fn test_placeholder_element_omits_default_idx() {
        assert_eq!(
            placeholder_element(PlaceholderInfo::new(0, PlaceholderKind::Title)),
            r#"<p:ph type="title"/>"#
        );
        assert_eq!(
            placeholder_element(PlaceholderInfo::new(1, PlaceholderKind::Untyped)),
            r#"<p:ph idx="1"/>"#
        );
    }

    #[test]
    fn test_rels_part_for() {
        assert_eq!(
            rels_part_for("ppt/slides/slide3.xml"),
            "ppt/slides/_rels/slide3.xml.rels"
        );
        assert_eq!(rels_part_for("document.xml"), "_rels/document.xml.rels");
    }
}
