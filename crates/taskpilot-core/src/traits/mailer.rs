//! Email capability.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait Mailer: Send + Sync {
    fn name(&self) -> &str;

    /// Send a plain-text email.
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}
