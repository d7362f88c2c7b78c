// Word-document path: worksheet prompt, template context and `.docx` rendering.

pub mod context;
pub mod prompts;
pub mod render;

pub use context::{WordContent, WordContext};
pub use render::{WordError, WordRenderer};
