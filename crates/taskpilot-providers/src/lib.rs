//! # Taskpilot Providers
//!
//! Text-generation backends. All hosted providers go through a single
//! `OpenAiCompatibleProvider`; `OfflineProvider` stands in when no key is set.

pub mod offline;
pub mod openai_compatible;
pub mod provider_registry;

use std::sync::Arc;

use taskpilot_core::config::LlmConfig;
use taskpilot_core::error::{PilotError, Result};
use taskpilot_core::traits::TextGenerator;

pub use offline::OfflineProvider;
pub use openai_compatible::OpenAiCompatibleProvider;

/// Create a text generator from the `[llm]` section.
///
/// A known provider without credentials degrades to the offline provider so
/// the service still classifies and routes tasks.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn TextGenerator>> {
    let name = config.provider.trim();

    match name {
        "" | "offline" => Ok(Arc::new(OfflineProvider::new())),

        other if other.starts_with("custom:") => {
            Ok(Arc::new(OpenAiCompatibleProvider::custom(other, config)?))
        }

        _ => {
            let registry = provider_registry::get_provider_config(name)
                .ok_or_else(|| PilotError::Config(format!("Unknown LLM provider '{name}'")))?;
            let provider = OpenAiCompatibleProvider::from_registry(registry, config)?;
            if provider.has_credentials() {
                tracing::info!("LLM provider: {} ({})", provider.name(), provider.model());
                Ok(Arc::new(provider))
            } else {
                tracing::warn!("No API key for '{name}', using offline provider");
                Ok(Arc::new(OfflineProvider::new()))
            }
        }
    }
}

/// List all available provider names.
pub fn available_providers() -> Vec<&'static str> {
    let mut names = provider_registry::all_provider_names();
    names.push("custom");
    names.push("offline");
    names
}
