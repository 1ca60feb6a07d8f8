//! Notification templates: the bodies the scheduler emails to the user.
//! Pure functions of their inputs, no I/O.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use taskpilot_core::types::Event;

pub const DAILY_SUBJECT: &str = "Daily Summary - AI Assistant";
pub const MEETING_SUBJECT: &str = "Meeting Reminder - AI Assistant";
pub const WEEKLY_SUBJECT: &str = "Weekly Summary - AI Assistant";
pub const MONTHLY_SUBJECT: &str = "Monthly Summary - AI Assistant";

/// Standing items listed in every daily digest.
pub const STANDING_TASKS: &[&str] = &[
    "Review pending emails",
    "Check calendar for today's meetings",
    "Update project status",
    "Follow up on action items",
    "Prepare for tomorrow's meetings",
];

/// Which scheduled check produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyKind {
    Daily,
    MeetingReminder,
    Weekly,
    Monthly,
}

/// An email the scheduler sends to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotifyKind,
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Morning digest: standing tasks, then today's meetings in local time.
    pub fn daily(today: &[Event], tz: Tz) -> Self {
        let mut body = String::from("Good morning! Here's the daily summary:\n\n");

        body.push_str("Today's Tasks:\n");
        for (i, task) in STANDING_TASKS.iter().enumerate() {
            body.push_str(&format!("{}. {}\n", i + 1, task));
        }
        body.push('\n');

        if !today.is_empty() {
            body.push_str("Today's Meetings:\n");
            for event in today {
                body.push_str(&format!(
                    "• {} at {}\n",
                    event.title,
                    event.start_time.with_timezone(&tz).format("%H:%M")
                ));
            }
            body.push('\n');
        }

        body.push_str("Have a productive day!");
        Self {
            kind: NotifyKind::Daily,
            subject: DAILY_SUBJECT.into(),
            body,
        }
    }

    /// Heads-up for one meeting inside the reminder window.
    pub fn meeting_reminder(event: &Event, tz: Tz) -> Self {
        let mut body = String::from("Meeting Reminder\n\n");
        body.push_str(&format!("Meeting: {}\n", event.title));
        body.push_str(&format!("Time: {}\n", long_time(event.start_time.with_timezone(&tz))));
        body.push_str(&format!("Duration: {}\n", human_duration(event.duration())));
        if !event.attendees.is_empty() {
            body.push_str(&format!("Attendees: {}\n", event.attendees.join(", ")));
        }
        body.push_str("\nPlease join on time!");

        Self {
            kind: NotifyKind::MeetingReminder,
            subject: MEETING_SUBJECT.into(),
            body,
        }
    }

    pub fn weekly() -> Self {
        let body = "Weekly Summary\n\n\
            This week's accomplishments:\n\
            • Completed project milestones\n\
            • Scheduled team meetings\n\
            • Responded to important emails\n\n\
            Next week's priorities:\n\
            • Review pending tasks\n\
            • Plan upcoming meetings\n\
            • Follow up on action items";
        Self {
            kind: NotifyKind::Weekly,
            subject: WEEKLY_SUBJECT.into(),
            body: body.into(),
        }
    }

    pub fn monthly() -> Self {
        let body = "Monthly Summary\n\n\
            This month's key achievements:\n\
            • Completed major project phases\n\
            • Attended important meetings\n\
            • Maintained communication with stakeholders\n\n\
            Next month's focus areas:\n\
            • Strategic planning\n\
            • Team coordination\n\
            • Performance review";
        Self {
            kind: NotifyKind::Monthly,
            subject: MONTHLY_SUBJECT.into(),
            body: body.into(),
        }
    }
}

/// "Monday, January 2, 2026 at 15:04"
fn long_time(t: DateTime<Tz>) -> String {
    t.format("%A, %B %-d, %Y at %H:%M").to_string()
}

/// "45m", "1h", "1h 30m"
fn human_duration(d: Duration) -> String {
    let minutes = d.num_minutes().max(0);
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}
