//! Google Calendar API v3: meeting creation and upcoming-event fetch.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{Value, json};
use taskpilot_core::config::CalendarConfig;
use taskpilot_core::error::{PilotError, Result};
use taskpilot_core::traits::Calendar;
use taskpilot_core::types::Event;

/// How far ahead `upcoming_events` looks.
const LOOKAHEAD_DAYS: i64 = 7;

// ============================================================================
// API response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<GoogleEventRaw>,
}

#[derive(Debug, Deserialize)]
struct GoogleEventRaw {
    #[serde(default)]
    summary: Option<String>,
    start: Option<EventDateTime>,
    end: Option<EventDateTime>,
    #[serde(default)]
    attendees: Vec<Attendee>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDateTime {
    date_time: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Attendee {
    #[serde(default)]
    email: String,
}

// ============================================================================
// Client
// ============================================================================

pub struct GoogleCalendar {
    token: String,
    base_url: String,
    calendar_id: String,
    tz: Tz,
    client: reqwest::Client,
}

impl GoogleCalendar {
    pub fn new(config: &CalendarConfig, tz: Tz) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| PilotError::Http(format!("client build: {e}")))?;
        Ok(Self {
            token: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            calendar_id: config.calendar_id.clone(),
            tz,
            client,
        })
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/{}/events", self.base_url, self.calendar_id)
    }
}

/// Insert-event payload.
pub fn build_event_body(
    attendees: &[String],
    start: DateTime<Utc>,
    duration_minutes: u32,
    title: &str,
    tz: Tz,
) -> Value {
    let end = start + Duration::minutes(i64::from(duration_minutes));
    json!({
        "summary": title,
        "start": { "dateTime": start.with_timezone(&tz).to_rfc3339(), "timeZone": tz.name() },
        "end": { "dateTime": end.with_timezone(&tz).to_rfc3339(), "timeZone": tz.name() },
        "attendees": attendees.iter().map(|a| json!({ "email": a })).collect::<Vec<_>>(),
        "reminders": { "useDefault": true },
    })
}

/// Parse an events-list response into `Event`s.
///
/// Cancelled events and entries without a usable start are dropped. All-day
/// events start at local midnight and end at the next local midnight.
pub fn parse_events(body: &str, tz: Tz) -> Result<Vec<Event>> {
    let resp: EventsResponse = serde_json::from_str(body)
        .map_err(|e| PilotError::Calendar(format!("decode events: {e}")))?;

    let events = resp
        .items
        .into_iter()
        .filter(|raw| raw.status.as_deref() != Some("cancelled"))
        .filter_map(|raw| {
            let start_time = raw.start.as_ref().and_then(|d| parse_when(d, tz))?;
            let end_time = raw
                .end
                .as_ref()
                .and_then(|d| parse_when(d, tz))
                .unwrap_or(start_time);
            Some(Event {
                title: raw.summary.unwrap_or_default(),
                start_time,
                end_time,
                attendees: raw
                    .attendees
                    .into_iter()
                    .map(|a| a.email)
                    .filter(|e| !e.is_empty())
                    .collect(),
            })
        })
        .collect();
    Ok(events)
}

fn parse_when(when: &EventDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    if let Some(dt) = &when.date_time {
        return DateTime::parse_from_rfc3339(dt)
            .ok()
            .map(|d| d.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(when.date.as_deref()?, "%Y-%m-%d").ok()?;
    tz.from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .earliest()
        .map(|d| d.with_timezone(&Utc))
}

#[async_trait]
impl Calendar for GoogleCalendar {
    fn name(&self) -> &str {
        "google"
    }

    async fn schedule_meeting(
        &self,
        attendees: &[String],
        start: DateTime<Utc>,
        duration_minutes: u32,
        title: &str,
    ) -> Result<()> {
        let body = build_event_body(attendees, start, duration_minutes, title, self.tz);
        let resp = self
            .client
            .post(self.events_url())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| PilotError::Http(format!("schedule meeting: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(PilotError::Calendar(format!("calendar API error {status}: {text}")));
        }

        tracing::info!(
            "📅 Scheduled '{}' at {} ({}min, {} attendee(s))",
            title,
            start.with_timezone(&self.tz).format("%Y-%m-%d %H:%M"),
            duration_minutes,
            attendees.len()
        );
        Ok(())
    }

    async fn upcoming_events(&self) -> Result<Vec<Event>> {
        let now = Utc::now();
        let time_min = now.to_rfc3339();
        let time_max = (now + Duration::days(LOOKAHEAD_DAYS)).to_rfc3339();

        let resp = self
            .client
            .get(self.events_url())
            .bearer_auth(&self.token)
            .query(&[
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
            ])
            .send()
            .await
            .map_err(|e| PilotError::Http(format!("list events: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| PilotError::Http(format!("read events: {e}")))?;
        if !status.is_success() {
            return Err(PilotError::Calendar(format!("calendar API error {status}: {text}")));
        }

        let events = parse_events(&text, self.tz)?;
        tracing::debug!("Fetched {} upcoming event(s)", events.len());
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_body() {
        let start = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        let body = build_event_body(
            &["a@example.com".into(), "b@example.com".into()],
            start,
            30,
            "Review",
            chrono_tz::Europe::Paris,
        );
        assert_eq!(body["summary"], "Review");
        assert_eq!(body["start"]["dateTime"], "2026-06-01T14:00:00+02:00");
        assert_eq!(body["end"]["dateTime"], "2026-06-01T14:30:00+02:00");
        assert_eq!(body["start"]["timeZone"], "Europe/Paris");
        assert_eq!(body["attendees"][1]["email"], "b@example.com");
    }

    #[test]
    fn test_parse_events() {
        let json = r#"{
            "items": [
                {
                    "summary": "Standup",
                    "start": {"dateTime": "2026-06-01T09:00:00Z"},
                    "end": {"dateTime": "2026-06-01T09:15:00Z"},
                    "attendees": [{"email": "team@example.com"}, {"email": ""}]
                },
                {
                    "summary": "Gone",
                    "status": "cancelled",
                    "start": {"dateTime": "2026-06-01T10:00:00Z"}
                },
                {
                    "summary": "Offsite",
                    "start": {"date": "2026-06-02"},
                    "end": {"date": "2026-06-03"}
                },
                { "summary": "No start" }
            ]
        }"#;
        let events = parse_events(json, Tz::UTC).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "Standup");
        assert_eq!(events[0].attendees, vec!["team@example.com"]);
        assert_eq!(events[0].duration(), Duration::minutes(15));
        assert_eq!(events[1].duration(), Duration::days(1));
    }

    #[test]
    fn test_parse_events_rejects_garbage() {
        assert!(matches!(
            parse_events("not json", Tz::UTC),
            Err(PilotError::Calendar(_))
        ));
    }

    #[test]
    fn test_events_url() {
        let cal = GoogleCalendar::new(&CalendarConfig::default(), Tz::UTC).unwrap();
        assert_eq!(
            cal.events_url(),
            "https://www.googleapis.com/calendar/v3/calendars/primary/events"
        );
    }
}
