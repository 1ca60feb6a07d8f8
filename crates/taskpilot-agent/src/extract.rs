//! Field extractors: pull structured values out of free text.
//!
//! Every function here is total: a miss yields a documented default, never an
//! error.

use chrono::{DateTime, Days, Duration, TimeZone};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::OnceLock;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email pattern")
    })
}

fn clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d{1,2}):?(\d{2})?\s*(am|pm)?").expect("clock pattern"))
}

fn quoted_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]+)""#).expect("quote pattern"))
}

/// Hour used when a clock pattern is present but its hour is unusable.
const FALLBACK_HOUR: u32 = 9;

/// Every email-shaped substring, left to right.
pub fn extract_emails(text: &str) -> Vec<String> {
    email_re()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// A clock time found in text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    /// Hour on the 24-hour clock.
    pub hour: u32,
    /// Whether the match had am/pm or a `:`, as opposed to a bare number.
    pub explicit: bool,
}

/// First `H[:MM][am|pm]` occurrence, converted to a 24-hour hour.
pub fn find_clock_time(text: &str) -> Option<ClockTime> {
    clock_re().captures(text).map(|caps| clock_from(&caps))
}

/// First occurrence that carries an am/pm marker or a `:`.
///
/// Bare digit runs ("2026", "alice2024@...") are skipped.
pub fn find_explicit_clock_time(text: &str) -> Option<ClockTime> {
    clock_re()
        .captures_iter(text)
        .map(|caps| clock_from(&caps))
        .find(|clock| clock.explicit)
}

fn clock_from(caps: &regex::Captures<'_>) -> ClockTime {
    let meridiem = caps.get(3).map(|m| m.as_str().to_ascii_lowercase());
    let explicit = meridiem.is_some() || caps[0].contains(':');

    let hour = caps[1]
        .parse::<u32>()
        .ok()
        .map(|h| match meridiem.as_deref() {
            Some("pm") if h != 12 => h + 12,
            Some("am") if h == 12 => 0,
            _ => h,
        })
        .filter(|h| *h < 24)
        .unwrap_or(FALLBACK_HOUR);

    ClockTime { hour, explicit }
}

/// Resolve one point in time from the text, relative to `now`.
///
/// Priority: "tomorrow" (+1 day), "next week" (+7 days), "today" (now), a clock
/// pattern (today at that hour, minutes zeroed), otherwise now + 1 hour. When a
/// day keyword matched and the text also carries an explicit clock time
/// ("tomorrow at 2pm"), that hour is applied to the keyword's day.
pub fn extract_time(text: &str, now: DateTime<Tz>) -> DateTime<Tz> {
    let lower = text.to_lowercase();
    let day_offset = if lower.contains("tomorrow") {
        Some(1)
    } else if lower.contains("next week") {
        Some(7)
    } else if lower.contains("today") {
        Some(0)
    } else {
        None
    };

    match day_offset {
        Some(days) => {
            let day = add_days(now, days);
            match find_explicit_clock_time(text) {
                Some(clock) => at_hour(day, clock.hour),
                None => day,
            }
        }
        None => match find_clock_time(text) {
            Some(clock) => at_hour(now, clock.hour),
            None => now + Duration::hours(1),
        },
    }
}

/// Same wall-clock time `days` later (calendar days, DST-aware).
fn add_days(t: DateTime<Tz>, days: u64) -> DateTime<Tz> {
    t.checked_add_days(Days::new(days))
        .unwrap_or_else(|| t + Duration::days(days as i64))
}

/// `t`'s local date at `hour`:00:00.
fn at_hour(t: DateTime<Tz>, hour: u32) -> DateTime<Tz> {
    t.date_naive()
        .and_hms_opt(hour, 0, 0)
        .and_then(|naive| t.timezone().from_local_datetime(&naive).earliest())
        .unwrap_or(t)
}

/// Meeting length in minutes: "hour"/"hr" → 60, "30" → 30, "15" → 15, else `default`.
pub fn extract_duration(text: &str, default: u32) -> u32 {
    let lower = text.to_lowercase();
    if lower.contains("hour") || lower.contains("hr") {
        60
    } else if lower.contains("30") {
        30
    } else if lower.contains("15") {
        15
    } else {
        default
    }
}

/// First double-quoted span, else the text after the first "about", else empty.
///
/// Used for both meeting/reminder titles and email subjects.
pub fn extract_title(text: &str) -> String {
    if let Some(caps) = quoted_re().captures(text) {
        return caps[1].to_string();
    }
    remainder_after(text, "about").unwrap_or_default()
}

/// Text after the first "saying", else after the first "message", else empty.
pub fn extract_body(text: &str) -> String {
    remainder_after(text, "saying")
        .or_else(|| remainder_after(text, "message"))
        .unwrap_or_default()
}

fn remainder_after(text: &str, keyword: &str) -> Option<String> {
    text.split_once(keyword)
        .map(|(_, rest)| rest.trim().to_string())
}
