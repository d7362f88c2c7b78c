//! Error types for slide-deck assembly.

use thiserror::Error;

use crate::package::PackageError;

pub type Result<T> = std::result::Result<T, DeckError>;

#[derive(Debug, Error)]
pub enum DeckError {
    /// Template or output package could not be read or written.
    #[error("Package error: {0}")]
    Package(#[from] PackageError),

    #[error("XML error in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: quick_xml::Error,
    },

    #[error("Invalid template: {reason}")]
    InvalidTemplate { reason: String },

    /// A section could not be rendered with the given layout.
    #[error("Layout {index} cannot render {section} section: {reason}")]
    LayoutRender {
        index: usize,
        section: &'static str,
        reason: String,
    },
}

impl DeckError {
    pub fn invalid_template(reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            reason: reason.into(),
        }
    }

    pub fn xml(part: impl Into<String>, source: quick_xml::Error) -> Self {
        Self::Xml {
            part: part.into(),
            source,
        }
    }
}
