// Slide-deck path: template location and introspection, layout selection,
// assembly, and package writing.

pub mod assembler;
pub mod error;
pub mod layout;
pub mod skeleton;
pub mod slide;
pub mod template;
pub mod writer;

pub use assembler::DeckAssembler;
pub use error::DeckError;
pub use layout::{LayoutPolicy, LayoutSelector};
pub use slide::{Deck, SlideKind};
pub use template::{DeckTemplate, TemplateLocator, UnknownDesign};
pub use writer::save_deck;
