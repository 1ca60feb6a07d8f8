//! Task and calendar data model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default meeting length when the task text names none.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Classification result that drives routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Schedule,
    Email,
    Reminder,
    General,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Email => "email",
            Self::Reminder => "reminder",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured request built from one task string.
///
/// Lives only for the duration of a `process_task` call. Empty string fields
/// mean "not found in the text"; the router substitutes defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub title: String,
    pub attendees: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl TaskRequest {
    /// Empty request of the given type, starting one hour after `now`.
    pub fn new(task_type: TaskType, now: DateTime<Utc>) -> Self {
        Self {
            task_type,
            title: String::new(),
            attendees: Vec::new(),
            start_time: now + Duration::hours(1),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            to: String::new(),
            subject: String::new(),
            body: String::new(),
        }
    }

    /// Meeting end: start plus duration.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// One calendar entry as supplied by the calendar collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub attendees: Vec<String>,
}

impl Event {
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }
}
