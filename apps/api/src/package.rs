//! OOXML package handling shared by the slide and word pipelines.
//!
//! `.pptx` and `.docx` files are ZIP archives of XML parts. A `Package` holds every
//! part in memory so parts can be patched and the archive rewritten.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Required part not found: {0}")]
    MissingPart(String),

    #[error("Part {part} is not valid UTF-8")]
    NotUtf8 { part: String },
}

/// An unpacked OOXML package. Parts are kept sorted so output is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(path: &Path) -> Result<Self, PackageError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, PackageError> {
        Self::from_reader(Cursor::new(data))
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, PackageError> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = BTreeMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            if name.ends_with('/') {
                continue;
            }
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            parts.insert(name, contents);
        }

        Ok(Self { parts })
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    /// Reads a part as UTF-8 text, failing if it is absent.
    pub fn text(&self, name: &str) -> Result<String, PackageError> {
        let bytes = self
            .get(name)
            .ok_or_else(|| PackageError::MissingPart(name.to_string()))?;
        String::from_utf8(bytes.to_vec()).map_err(|_| PackageError::NotUtf8 {
            part: name.to_string(),
        })
    }

    pub fn set(&mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.parts.insert(name.into(), contents.into());
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PackageError> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<(), PackageError> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // [Content_Types].xml sorts first among the usual part names.
        for (name, contents) in &self.parts {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(contents)?;
        }

        zip.finish()?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), PackageError> {
        let file = std::fs::File::create(path)?;
        self.write_to(std::io::BufWriter::new(file))
    }
}

/// Escapes text for use in XML character data and attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters other than tab/newline are invalid in XML 1.0.
            c if (c as u32) < 0x20 && c != '\t' && c != '\n' && c != '\r' => {}
            c => out.push(c),
        }
    }
    out
}
