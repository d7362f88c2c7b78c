// Content model and parsing for model output.
// All model output enters the pipelines through `parser`, which never fails.

pub mod model;
pub mod parser;
pub mod prompts;

pub use model::{ParsedContent, SectionSpec};
pub use parser::{extract_json_object, parse_content};
