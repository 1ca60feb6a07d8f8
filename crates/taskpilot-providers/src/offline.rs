//! Offline provider: used when no API key is configured.

use async_trait::async_trait;
use taskpilot_core::error::Result;
use taskpilot_core::traits::TextGenerator;

/// Answers every command with a fixed acknowledgement, without network access.
#[derive(Debug, Default, Clone)]
pub struct OfflineProvider;

impl OfflineProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextGenerator for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    async fn process_command(&self, text: &str) -> Result<String> {
        tracing::debug!("Offline provider handling command ({} chars)", text.len());
        Ok(format!(
            "I received your request: \"{}\". No language model is configured, \
             so I will handle it with the built-in task rules.",
            text.trim()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_echoes_command() {
        let reply = OfflineProvider::new()
            .process_command("  book a room ")
            .await
            .unwrap();
        assert!(reply.contains("\"book a room\""));
    }
}
