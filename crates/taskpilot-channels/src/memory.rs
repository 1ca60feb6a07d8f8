//! In-memory collaborators.
//!
//! `MemoryCalendar` keeps meetings in a list and serves them back as events;
//! `MemoryMailer` logs each message and keeps a copy. Both are the offline
//! fallbacks for missing credentials, so every list is bounded.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, MutexGuard};
use taskpilot_core::error::Result;
use taskpilot_core::traits::{Calendar, Mailer};
use taskpilot_core::types::Event;

/// Most records kept per list; the oldest is dropped first.
pub const MAX_HISTORY: usize = 100;

/// How far ahead `upcoming_events` looks.
const LOOKAHEAD_DAYS: i64 = 7;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn push_bounded<T>(list: &mut Vec<T>, item: T) {
    list.push(item);
    if list.len() > MAX_HISTORY {
        list.remove(0);
    }
}

/// A meeting accepted by `MemoryCalendar::schedule_meeting`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledMeeting {
    pub attendees: Vec<String>,
    pub start: DateTime<Utc>,
    pub duration_minutes: u32,
    pub title: String,
}

#[derive(Debug, Default)]
pub struct MemoryCalendar {
    events: Mutex<Vec<Event>>,
    scheduled: Mutex<Vec<ScheduledMeeting>>,
    /// Fixed "now" for the lookahead window; wall clock when unset.
    pinned_now: Option<DateTime<Utc>>,
}

impl MemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calendar pre-filled with `events`.
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            events: Mutex::new(events),
            scheduled: Mutex::new(Vec::new()),
            pinned_now: None,
        }
    }

    /// Evaluate the lookahead window against `now` instead of the wall clock.
    pub fn pinned_at(mut self, now: DateTime<Utc>) -> Self {
        self.pinned_now = Some(now);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.pinned_now.unwrap_or_else(Utc::now)
    }

    /// The most recent meetings (up to `MAX_HISTORY`), in call order.
    pub fn scheduled(&self) -> Vec<ScheduledMeeting> {
        lock(&self.scheduled).clone()
    }
}

#[async_trait]
impl Calendar for MemoryCalendar {
    fn name(&self) -> &str {
        "memory"
    }

    async fn schedule_meeting(
        &self,
        attendees: &[String],
        start: DateTime<Utc>,
        duration_minutes: u32,
        title: &str,
    ) -> Result<()> {
        tracing::info!(
            "📅 [memory] Scheduled '{}' at {} for {}min with {:?}",
            title,
            start.format("%Y-%m-%d %H:%M:%S"),
            duration_minutes,
            attendees
        );
        let meeting = ScheduledMeeting {
            attendees: attendees.to_vec(),
            start,
            duration_minutes,
            title: title.to_string(),
        };
        let now = self.now();
        {
            let mut events = lock(&self.events);
            events.retain(|e| e.end_time >= now);
            push_bounded(
                &mut events,
                Event {
                    title: meeting.title.clone(),
                    start_time: start,
                    end_time: start + Duration::minutes(i64::from(duration_minutes)),
                    attendees: meeting.attendees.clone(),
                },
            );
        }
        push_bounded(&mut lock(&self.scheduled), meeting);
        Ok(())
    }

    /// Events starting in `[now, now + 7 days]`, earliest first.
    async fn upcoming_events(&self) -> Result<Vec<Event>> {
        let now = self.now();
        let until = now + Duration::days(LOOKAHEAD_DAYS);
        let mut events: Vec<Event> = lock(&self.events)
            .iter()
            .filter(|e| e.start_time >= now && e.start_time <= until)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.start_time);
        Ok(events)
    }
}

/// A message accepted by `MemoryMailer::send_email`.
#[derive(Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<SentEmail>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent messages (up to `MAX_HISTORY`), in call order.
    pub fn sent(&self) -> Vec<SentEmail> {
        lock(&self.sent).clone()
    }

    pub fn sent_count(&self) -> usize {
        lock(&self.sent).len()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    fn name(&self) -> &str {
        "memory"
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        tracing::info!("📤 [memory] Email to {to}: {subject}");
        tracing::debug!("Body:\n{body}");
        push_bounded(
            &mut lock(&self.sent),
            SentEmail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            },
        );
        Ok(())
    }
}
