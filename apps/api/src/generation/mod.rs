// Generation pipelines and their HTTP handlers.
// All completion calls go through the `CompletionClient` held in `AppState`.

pub mod handlers;
pub mod pipeline;
