//! Text-generation capability.

use async_trait::async_trait;

use crate::error::Result;

/// A text-generation backend that answers a free-text command.
///
/// The reply is advisory: callers display it but never route on it.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn process_command(&self, text: &str) -> Result<String>;
}
