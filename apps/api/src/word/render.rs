//! Renders worksheet `.docx` templates.
//!
//! The template's `word/document.xml`, headers and footers are Jinja templates.
//! Word tends to split a tag like `{{ theme }}` across several runs, so each part is
//! normalised before rendering: markup inside tags is removed and paragraph-level
//! tags (`{%p ... %}`, `{%tr ... %}`, `{%tc ... %}`, `{%r ... %}`) replace their
//! enclosing element.

use std::fmt::Write as _;
use std::path::Path;

use minijinja::{Environment, ErrorKind, Output, State, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::package::{escape_xml, Package, PackageError};
use crate::word::context::WordContext;

const DOCUMENT_PART: &str = "word/document.xml";
const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

#[derive(Debug, Error)]
pub enum WordError {
    #[error("Package error: {0}")]
    Package(#[from] PackageError),

    #[error("Template error in {part}: {source}")]
    Template {
        part: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),
}

pub type Result<T> = std::result::Result<T, WordError>;

pub struct WordRenderer {
    env: Environment<'static>,
}

impl Default for WordRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl WordRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_formatter(xml_formatter);
        env.add_function("enumerate", enumerate);
        Self { env }
    }

    /// Renders the template at `template_path` into `output`. A missing template
    /// produces a plain document listing the context instead.
    pub fn render_to_file(
        &self,
        template_path: &Path,
        context: &WordContext,
        output: &Path,
    ) -> Result<()> {
        let package = if template_path.exists() {
            info!("Using word template {}", template_path.display());
            self.render_package(Package::open(template_path)?, context)?
        } else {
            warn!(
                "Word template {} does not exist; writing a plain document",
                template_path.display()
            );
            blank_document(context)
        };
        package.save(output)?;
        info!("Saved document to {}", output.display());
        Ok(())
    }

    pub fn render_package(&self, mut package: Package, context: &WordContext) -> Result<Package> {
        if !package.contains(DOCUMENT_PART) {
            return Err(WordError::InvalidTemplate(format!(
                "package has no {DOCUMENT_PART}"
            )));
        }

        let parts: Vec<String> = package
            .part_names()
            .filter(|name| is_templated_part(name))
            .map(str::to_string)
            .collect();

        for part in parts {
            let xml = package.text(&part)?;
            let prepared = prepare_xml(&xml);
            let rendered = self
                .env
                .render_str(&prepared, context)
                .map_err(|source| WordError::Template {
                    part: part.clone(),
                    source,
                })?;
            debug!("Rendered {}", part);
            package.set(part, rendered);
        }

        Ok(package)
    }
}

fn is_templated_part(name: &str) -> bool {
    if name == DOCUMENT_PART {
        return true;
    }
    name.strip_prefix("word/")
        .filter(|rest| !rest.contains('/'))
        .map(|file| {
            (file.starts_with("header") || file.starts_with("footer")) && file.ends_with(".xml")
        })
        .unwrap_or(false)
}

/// `enumerate(items)`: `[index, item]` pairs counting from 0, for
/// `{% for i, q in enumerate(quiz_data) %}` loops in lesson templates.
fn enumerate(items: Value) -> std::result::Result<Value, minijinja::Error> {
    let pairs: Vec<Value> = items
        .try_iter()?
        .enumerate()
        .map(|(i, item)| Value::from(vec![Value::from(i), item]))
        .collect();
    Ok(Value::from(pairs))
}

/// Writes values XML-escaped; newlines become Word line breaks.
fn xml_formatter(
    out: &mut Output<'_>,
    _state: &State<'_, '_>,
    value: &Value,
) -> std::result::Result<(), minijinja::Error> {
    if value.is_undefined() || value.is_none() {
        return Ok(());
    }
    out.write_str(&xml_text(&value.to_string()))
        .map_err(|_| minijinja::Error::new(ErrorKind::WriteFailure, "could not write output"))
}

fn xml_text(text: &str) -> String {
    escape_xml(&text.replace('\r', ""))
        .replace('\n', r#"</w:t><w:br/><w:t xml:space="preserve">"#)
}

// ────────────────────────────────────────────────────────────────────────────
// Tag normalisation
// ────────────────────────────────────────────────────────────────────────────

fn prepare_xml(xml: &str) -> String {
    let joined = join_split_delimiters(xml);
    let cleaned = clean_tags(&joined);
    lift_block_tags(&cleaned)
}

/// Removes markup between the two characters of a delimiter (`{{`, `{%`, `%}`, `}}`).
fn join_split_delimiters(xml: &str) -> String {
    let bytes = xml.as_bytes();
    let mut out = String::with_capacity(xml.len());
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if matches!(c, b'{' | b'%' | b'}') {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j] == b'<' {
                match xml[j..].find('>') {
                    Some(end) => j += end + 1,
                    None => break,
                }
            }
            if j > i + 1 && j < bytes.len() && is_delimiter_pair(c, bytes[j]) {
                out.push_str(&xml[last..=i]);
                last = j;
                i = j;
                continue;
            }
        }
        i += 1;
    }

    out.push_str(&xml[last..]);
    out
}

fn is_delimiter_pair(first: u8, second: u8) -> bool {
    matches!((first, second), (b'{', b'{') | (b'{', b'%') | (b'%', b'}') | (b'}', b'}'))
}

/// Strips markup and entities from the inside of every `{{ }}` and `{% %}` tag.
fn clean_tags(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;

    while let Some(start) = find_open(rest) {
        let (open, close) = if rest[start..].starts_with("{{") {
            ("{{", "}}")
        } else {
            ("{%", "%}")
        };
        let body_start = start + open.len();
        let Some(len) = rest[body_start..].find(close) else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(open);
        out.push_str(&clean_body(&rest[body_start..body_start + len]));
        out.push_str(close);
        rest = &rest[body_start + len + close.len()..];
    }

    out.push_str(rest);
    out
}

fn find_open(s: &str) -> Option<usize> {
    match (s.find("{{"), s.find("{%")) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn clean_body(body: &str) -> String {
    let mut text = String::with_capacity(body.len());
    let mut in_markup = false;
    for c in body.chars() {
        match c {
            '<' => in_markup = true,
            '>' if in_markup => in_markup = false,
            _ if in_markup => {}
            c => text.push(c),
        }
    }
    text.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201c}', '\u{201d}'], "\"")
}

/// Replaces the element enclosing each `{%p ... %}`-style tag with a plain `{% ... %}`.
fn lift_block_tags(xml: &str) -> String {
    let mut xml = xml.to_string();
    for (marker, element) in [("{%p", "w:p"), ("{%tr", "w:tr"), ("{%tc", "w:tc"), ("{%r", "w:r")] {
        let mut from = 0;
        while let Some(offset) = xml[from..].find(marker) {
            let pos = from + offset;
            let after = pos + marker.len();
            if !xml[after..].starts_with(char::is_whitespace) {
                from = after;
                continue;
            }
            let Some(close) = xml[after..].find("%}").map(|i| after + i) else {
                break;
            };
            let directive = format!("{{%{}%}}", &xml[after..close]);

            let open_plain = format!("<{element}>");
            let open_attrs = format!("<{element} ");
            let start = match (xml[..pos].rfind(&open_plain), xml[..pos].rfind(&open_attrs)) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
            let end_tag = format!("</{element}>");
            let end = xml[close..].find(&end_tag).map(|i| close + i + end_tag.len());

            match (start, end) {
                (Some(start), Some(end)) => {
                    xml.replace_range(start..end, &directive);
                    from = start + directive.len();
                }
                _ => {
                    // No enclosing element: keep the tag where it is.
                    xml.replace_range(pos..close + 2, &directive);
                    from = pos + directive.len();
                }
            }
        }
    }
    xml
}

// ────────────────────────────────────────────────────────────────────────────
// Blank document
// ────────────────────────────────────────────────────────────────────────────

/// A minimal `.docx` listing the worksheet context.
pub fn blank_document(context: &WordContext) -> Package {
    let mut body = paragraph(&context.worksheet_title, true);
    for (label, value) in context.summary() {
        if value.is_empty() {
            continue;
        }
        body.push_str(&paragraph(label, true));
        for line in value.lines() {
            body.push_str(&paragraph(line, false));
        }
    }

    let mut package = Package::new();
    package.set(
        "[Content_Types].xml",
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#,
    );
    package.set(
        "_rels/.rels",
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#,
    );
    package.set(
        DOCUMENT_PART,
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{NS_W}"><w:body>{body}<w:sectPr/></w:body></w:document>"#
        ),
    );
    package
}

fn paragraph(text: &str, bold: bool) -> String {
    let props = if bold { "<w:rPr><w:b/></w:rPr>" } else { "" };
    format!(
        r#"<w:p><w:r>{props}<w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape_xml(text)
    )
}
