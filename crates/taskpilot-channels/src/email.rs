//! SMTP mailer: async lettre transport over STARTTLS.
//!
//! Works with Gmail, Outlook, SendGrid's SMTP relay or any custom server.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use taskpilot_core::config::EmailConfig;
use taskpilot_core::error::{PilotError, Result};
use taskpilot_core::traits::Mailer;

pub struct SmtpMailer {
    config: EmailConfig,
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Result<Self> {
        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
            .parse()
            .map_err(|e| PilotError::Config(format!("Invalid from address: {e}")))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| PilotError::Config(format!("SMTP relay: {e}")))?
            .port(config.smtp_port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        tracing::info!("📧 SMTP mailer: {}:{}", config.smtp_host, config.smtp_port);
        Ok(Self {
            config,
            from,
            transport: builder.build(),
        })
    }

    /// Build the plain-text message without sending it.
    pub fn build_message(&self, to: &str, subject: &str, body: &str) -> Result<Message> {
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| PilotError::Email(format!("Invalid to '{to}': {e}")))?;

        Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| PilotError::Email(format!("Build email: {e}")))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let email = self.build_message(to, subject, body)?;

        self.transport
            .send(email)
            .await
            .map_err(|e| PilotError::Email(format!("SMTP send via {}: {e}", self.config.smtp_host)))?;

        tracing::info!("📤 Email sent to: {to}");
        Ok(())
    }
}
