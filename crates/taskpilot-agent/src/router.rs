//! Task router: one downstream collaborator call per task type.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskpilot_core::error::Result;
use taskpilot_core::traits::{Calendar, Mailer};
use taskpilot_core::types::{TaskRequest, TaskType};

pub const DEFAULT_MEETING_TITLE: &str = "Meeting scheduled by AI Assistant";
pub const DEFAULT_EMAIL_SUBJECT: &str = "Message from AI Assistant";
pub const DEFAULT_EMAIL_BODY: &str = "This is an automated message from the AI Assistant.";
pub const DEFAULT_REMINDER_TITLE: &str = "Reminder from AI Assistant";

/// What the router did with a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    MeetingScheduled {
        title: String,
        attendees: Vec<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    },
    EmailSent {
        to: String,
        subject: String,
    },
    ReminderSent {
        to: String,
        subject: String,
    },
    /// General tasks trigger no collaborator call.
    None,
}

pub struct TaskRouter {
    calendar: Arc<dyn Calendar>,
    mailer: Arc<dyn Mailer>,
    user_email: String,
    tz: Tz,
}

impl TaskRouter {
    pub fn new(
        calendar: Arc<dyn Calendar>,
        mailer: Arc<dyn Mailer>,
        user_email: impl Into<String>,
        tz: Tz,
    ) -> Self {
        Self {
            calendar,
            mailer,
            user_email: user_email.into(),
            tz,
        }
    }

    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    /// Fill defaults for `req` and perform its action.
    ///
    /// Collaborator errors are returned unchanged.
    pub async fn route(&self, req: &TaskRequest) -> Result<Action> {
        match req.task_type {
            TaskType::Schedule => self.schedule(req).await,
            TaskType::Email => self.email(req).await,
            TaskType::Reminder => self.remind(req).await,
            TaskType::General => {
                tracing::debug!("General task, nothing to route");
                Ok(Action::None)
            }
        }
    }

    async fn schedule(&self, req: &TaskRequest) -> Result<Action> {
        let attendees = if req.attendees.is_empty() {
            vec![self.user_email.clone()]
        } else {
            req.attendees.clone()
        };
        let title = or_default(&req.title, DEFAULT_MEETING_TITLE);

        tracing::info!(
            "📅 Scheduling '{}' with {:?} at {}",
            title,
            attendees,
            self.local(req.start_time)
        );
        self.calendar
            .schedule_meeting(&attendees, req.start_time, req.duration_minutes, &title)
            .await?;

        Ok(Action::MeetingScheduled {
            title,
            attendees,
            start_time: req.start_time,
            end_time: req.end_time(),
        })
    }

    async fn email(&self, req: &TaskRequest) -> Result<Action> {
        let to = or_default(&req.to, &self.user_email);
        let subject = or_default(&req.subject, DEFAULT_EMAIL_SUBJECT);
        let body = or_default(&req.body, DEFAULT_EMAIL_BODY);

        tracing::info!("📧 Emailing {to}: {subject}");
        self.mailer.send_email(&to, &subject, &body).await?;
        Ok(Action::EmailSent { to, subject })
    }

    async fn remind(&self, req: &TaskRequest) -> Result<Action> {
        let title = or_default(&req.title, DEFAULT_REMINDER_TITLE);
        let subject = format!("Reminder: {title}");
        let body = reminder_body(&title, req.start_time.with_timezone(&self.tz));

        tracing::info!("⏰ Reminder '{}' for {}", title, self.local(req.start_time));
        self.mailer
            .send_email(&self.user_email, &subject, &body)
            .await?;
        Ok(Action::ReminderSent {
            to: self.user_email.clone(),
            subject,
        })
    }

    fn local(&self, t: DateTime<Utc>) -> String {
        t.with_timezone(&self.tz).format("%Y-%m-%d %H:%M").to_string()
    }
}

/// Body of a reminder email.
pub fn reminder_body(title: &str, at: DateTime<Tz>) -> String {
    format!(
        "This is a reminder for: {title}\nScheduled for: {}",
        at.format("%Y-%m-%d %H:%M:%S")
    )
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}
