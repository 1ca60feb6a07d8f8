//! Task classifier: keyword rule table plus per-type field extraction.

use crate::extract::{extract_body, extract_duration, extract_emails, extract_time, extract_title};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use taskpilot_core::types::{DEFAULT_DURATION_MINUTES, TaskRequest, TaskType};

/// Ordered rules; the first rule with any keyword present wins.
const RULES: &[(&[&str], TaskType)] = &[
    (&["schedule", "meeting"], TaskType::Schedule),
    (&["email", "send"], TaskType::Email),
    (&["remind", "reminder"], TaskType::Reminder),
];

/// Task type of `text`, matched case-insensitively against the rule table.
pub fn classify(text: &str) -> TaskType {
    let lower = text.to_lowercase();
    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, task_type)| *task_type)
        .unwrap_or(TaskType::General)
}

/// Classify `text` and run the extractors its type needs.
///
/// Fields the text does not supply stay empty; the router fills defaults.
pub fn parse_task(text: &str, now: DateTime<Utc>, tz: Tz) -> TaskRequest {
    let task_type = classify(text);
    let mut req = TaskRequest::new(task_type, now);
    let local_now = now.with_timezone(&tz);

    match task_type {
        TaskType::Schedule => {
            req.attendees = extract_emails(text);
            req.start_time = extract_time(text, local_now).with_timezone(&Utc);
            req.duration_minutes = extract_duration(text, DEFAULT_DURATION_MINUTES);
            req.title = extract_title(text);
        }
        TaskType::Email => {
            req.to = extract_emails(text).into_iter().next().unwrap_or_default();
            req.subject = extract_title(text);
            req.body = extract_body(text);
        }
        TaskType::Reminder => {
            req.start_time = extract_time(text, local_now).with_timezone(&Utc);
            req.title = extract_title(text);
        }
        TaskType::General => {
            req.title = text.to_string();
        }
    }

    tracing::debug!("Classified as {task_type}: {req:?}");
    req
}
