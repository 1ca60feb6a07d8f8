//! # Taskpilot Channels
//! Outbound collaborators: the calendar and the mailbox.
//!
//! Each capability has a network implementation and an in-memory one. The
//! in-memory versions are used when credentials are missing and in tests.

pub mod calendar;
pub mod email;
pub mod memory;

use std::sync::Arc;

use chrono_tz::Tz;
use taskpilot_core::config::TaskpilotConfig;
use taskpilot_core::error::Result;
use taskpilot_core::traits::{Calendar, Mailer};

pub use calendar::GoogleCalendar;
pub use email::SmtpMailer;
pub use memory::{MemoryCalendar, MemoryMailer, ScheduledMeeting, SentEmail};

/// Build the calendar collaborator from config.
pub fn create_calendar(config: &TaskpilotConfig, tz: Tz) -> Result<Arc<dyn Calendar>> {
    if config.calendar.api_key.is_empty() {
        tracing::warn!("No calendar token configured, using in-memory calendar");
        return Ok(Arc::new(MemoryCalendar::new()));
    }
    Ok(Arc::new(GoogleCalendar::new(&config.calendar, tz)?))
}

/// Build the mail collaborator from config.
pub fn create_mailer(config: &TaskpilotConfig) -> Result<Arc<dyn Mailer>> {
    if config.email.smtp_host.is_empty() {
        tracing::warn!("No SMTP host configured, emails will only be logged");
        return Ok(Arc::new(MemoryMailer::new()));
    }
    Ok(Arc::new(SmtpMailer::new(config.email.clone())?))
}
