use std::sync::Arc;

use crate::config::Config;
use crate::deck::{LayoutSelector, TemplateLocator};
use crate::llm_client::CompletionClient;
use crate::placement::OutputPlacement;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Completion endpoint. `LlmClient` in production.
    pub llm: Arc<dyn CompletionClient>,
    pub templates: TemplateLocator,
    /// Owns the process-wide layout-detection cache.
    pub layouts: Arc<LayoutSelector>,
    pub placement: OutputPlacement,
}

impl AppState {
    pub fn new(config: Config, llm: Arc<dyn CompletionClient>) -> Self {
        Self {
            templates: TemplateLocator::new(&config.deck),
            layouts: Arc::new(LayoutSelector::from_settings(&config.deck)),
            placement: OutputPlacement::new(config.output_root.clone()),
            config: Arc::new(config),
            llm,
        }
    }
}
