//! Scheduler engine: the background loop that emails digests and meeting reminders.
//! Uses tokio::interval for ticking; one evaluation pass per tick.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use taskpilot_core::config::{TaskpilotConfig, parse_hhmm};
use taskpilot_core::error::{PilotError, Result};
use taskpilot_core::traits::{Calendar, Mailer};
use taskpilot_core::types::Event;

use crate::notify::Notification;

/// Weekly and monthly summaries go out at this local time.
const SUMMARY_HOUR: u32 = 9;
const SUMMARY_MINUTE: u32 = 0;

/// Scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// Resolved scheduler settings.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub user_email: String,
    pub tz: Tz,
    /// Local (hour, minute) of the daily digest; `None` never fires.
    pub daily_at: Option<(u32, u32)>,
    pub reminder_window: Duration,
    pub tick: std::time::Duration,
}

impl SchedulerSettings {
    pub fn from_config(config: &TaskpilotConfig) -> Result<Self> {
        let daily_at = parse_hhmm(&config.scheduler.daily_reminder_time);
        if daily_at.is_none() {
            tracing::warn!(
                "Unparsable daily_reminder_time '{}', daily digest disabled",
                config.scheduler.daily_reminder_time
            );
        }
        Ok(Self {
            user_email: config.user.email.clone(),
            tz: config.timezone()?,
            daily_at,
            reminder_window: Duration::minutes(i64::from(config.scheduler.meeting_reminder_minutes)),
            tick: std::time::Duration::from_secs(config.scheduler.tick_secs.max(1)),
        })
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            user_email: "me@example.com".into(),
            tz: Tz::UTC,
            daily_at: Some((9, 0)),
            reminder_window: Duration::minutes(15),
            tick: std::time::Duration::from_secs(60),
        }
    }
}

/// What one evaluation pass did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PassReport {
    /// Notifications delivered to the mailer.
    pub sent: Vec<Notification>,
    /// Checks that failed (calendar fetch, email send), already logged.
    pub failures: Vec<String>,
}

impl PassReport {
    pub fn is_quiet(&self) -> bool {
        self.sent.is_empty() && self.failures.is_empty()
    }
}

struct Inner {
    settings: SchedulerSettings,
    calendar: Arc<dyn Calendar>,
    mailer: Arc<dyn Mailer>,
}

struct Running {
    cancel: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Periodic scheduler with a Stopped/Running lifecycle.
pub struct PeriodicScheduler {
    inner: Arc<Inner>,
    running: Mutex<Option<Running>>,
}

impl PeriodicScheduler {
    pub fn new(
        settings: SchedulerSettings,
        calendar: Arc<dyn Calendar>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                calendar,
                mailer,
            }),
            running: Mutex::new(None),
        }
    }

    fn running(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> SchedulerState {
        if self.running().is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.inner.settings
    }

    /// Spawn the loop. Must be called inside a tokio runtime.
    pub fn start(&self) -> Result<()> {
        let mut running = self.running();
        if running.is_some() {
            return Err(PilotError::Scheduler("scheduler is already running".into()));
        }

        let (cancel, rx) = oneshot::channel();
        let handle = tokio::spawn(run_loop(self.inner.clone(), rx));
        *running = Some(Running { cancel, handle });

        tracing::info!(
            "⏰ Scheduler started (check every {}s)",
            self.inner.settings.tick.as_secs()
        );
        Ok(())
    }

    /// Signal the loop and wait for it to exit.
    pub async fn stop(&self) -> Result<()> {
        let taken = self.running().take();
        let Some(Running { cancel, handle }) = taken else {
            return Err(PilotError::Scheduler("scheduler is not running".into()));
        };

        // The loop may already be gone if it panicked.
        let _ = cancel.send(());
        handle
            .await
            .map_err(|e| PilotError::Scheduler(format!("scheduler task failed: {e}")))?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }

    /// Run every check once against `now`.
    pub async fn evaluate(&self, now: DateTime<Utc>) -> PassReport {
        self.inner.evaluate(now).await
    }
}

async fn run_loop(inner: Arc<Inner>, mut cancel: oneshot::Receiver<()>) {
    let mut interval = tokio::time::interval(inner.settings.tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = &mut cancel => break,
            _ = interval.tick() => {
                let report = inner.evaluate(Utc::now()).await;
                if !report.is_quiet() {
                    tracing::debug!(
                        "Pass done: {} sent, {} failed",
                        report.sent.len(),
                        report.failures.len()
                    );
                }
            }
        }
    }
}

impl Inner {
    async fn evaluate(&self, now: DateTime<Utc>) -> PassReport {
        let s = &self.settings;
        let local = now.with_timezone(&s.tz);
        let mut report = PassReport::default();
        tracing::debug!("Checking scheduled tasks at {}", local.format("%Y-%m-%d %H:%M"));

        let events = match self.calendar.upcoming_events().await {
            Ok(events) => Some(events),
            Err(e) => {
                tracing::error!("Failed to get upcoming events: {e}");
                report.failures.push(format!("calendar: {e}"));
                None
            }
        };

        if let Some((hour, minute)) = s.daily_at
            && local.hour() == hour
            && local.minute() == minute
        {
            let today = events
                .as_deref()
                .map(|events| todays_events(events, local))
                .unwrap_or_default();
            self.send(Notification::daily(&today, s.tz), &mut report).await;
        }

        if let Some(events) = &events {
            for event in events {
                let until = event.start_time - now;
                if until > Duration::zero() && until <= s.reminder_window {
                    tracing::info!("🔔 Meeting '{}' starts in {}m", event.title, until.num_minutes());
                    self.send(Notification::meeting_reminder(event, s.tz), &mut report)
                        .await;
                }
            }
        }

        let summary_time = local.hour() == SUMMARY_HOUR && local.minute() == SUMMARY_MINUTE;
        if summary_time && local.weekday() == Weekday::Mon {
            self.send(Notification::weekly(), &mut report).await;
        }
        if summary_time && local.day() == 1 {
            self.send(Notification::monthly(), &mut report).await;
        }

        report
    }

    async fn send(&self, notification: Notification, report: &mut PassReport) {
        let to = &self.settings.user_email;
        match self
            .mailer
            .send_email(to, &notification.subject, &notification.body)
            .await
        {
            Ok(()) => {
                tracing::info!("📧 {:?} notification sent to {to}", notification.kind);
                report.sent.push(notification);
            }
            Err(e) => {
                tracing::error!("Failed to send {:?} notification: {e}", notification.kind);
                report.failures.push(format!("{:?}: {e}", notification.kind));
            }
        }
    }
}

/// Events starting within `local`'s calendar day.
fn todays_events(events: &[Event], local: DateTime<Tz>) -> Vec<Event> {
    let tz = local.timezone();
    let midnight = |date: chrono::NaiveDate| {
        date.and_hms_opt(0, 0, 0)
            .and_then(|n| tz.from_local_datetime(&n).earliest())
            .map(|t| t.with_timezone(&Utc))
    };
    let today = local.date_naive();
    let (Some(start), Some(end)) = (midnight(today), today.succ_opt().and_then(midnight)) else {
        return Vec::new();
    };

    events
        .iter()
        .filter(|e| e.start_time >= start && e.start_time < end)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{DAILY_SUBJECT, NotifyKind};
    use async_trait::async_trait;
    use taskpilot_channels::{MemoryCalendar, MemoryMailer};

    struct BrokenCalendar;

    #[async_trait]
    impl Calendar for BrokenCalendar {
        fn name(&self) -> &str {
            "broken"
        }

        async fn schedule_meeting(
            &self,
            _attendees: &[String],
            _start: DateTime<Utc>,
            _duration_minutes: u32,
            _title: &str,
        ) -> Result<()> {
            Err(PilotError::Calendar("offline".into()))
        }

        async fn upcoming_events(&self) -> Result<Vec<Event>> {
            Err(PilotError::Calendar("offline".into()))
        }
    }

    /// Refuses the daily digest, delivers everything else.
    #[derive(Default)]
    struct DigestRejectingMailer {
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Mailer for DigestRejectingMailer {
        fn name(&self) -> &str {
            "digest-rejecting"
        }

        async fn send_email(&self, _to: &str, subject: &str, _body: &str) -> Result<()> {
            if subject == DAILY_SUBJECT {
                return Err(PilotError::Email("550 mailbox unavailable".into()));
            }
            self.delivered
                .lock()
                .unwrap()
                .push(subject.to_string());
            Ok(())
        }
    }

    fn event(title: &str, start: DateTime<Utc>) -> Event {
        Event {
            title: title.into(),
            start_time: start,
            end_time: start + Duration::minutes(30),
            attendees: vec![],
        }
    }

    fn scheduler(events: Vec<Event>) -> (PeriodicScheduler, Arc<MemoryMailer>) {
        let mailer = Arc::new(MemoryMailer::new());
        let sched = PeriodicScheduler::new(
            SchedulerSettings::default(),
            Arc::new(MemoryCalendar::with_events(events)),
            mailer.clone(),
        );
        (sched, mailer)
    }

    /// Like `scheduler`, with the calendar's lookahead anchored at `now`.
    fn scheduler_at(now: DateTime<Utc>, events: Vec<Event>) -> (PeriodicScheduler, Arc<MemoryMailer>) {
        let mailer = Arc::new(MemoryMailer::new());
        let sched = PeriodicScheduler::new(
            SchedulerSettings::default(),
            Arc::new(MemoryCalendar::with_events(events).pinned_at(now)),
            mailer.clone(),
        );
        (sched, mailer)
    }

    fn kinds(report: &PassReport) -> Vec<NotifyKind> {
        report.sent.iter().map(|n| n.kind).collect()
    }

    #[tokio::test]
    async fn test_monday_first_at_nine_fires_all() {
        // 2026-06-01 is a Monday
        let (sched, mailer) = scheduler(vec![]);
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 30).unwrap();

        let report = sched.evaluate(now).await;
        assert_eq!(
            kinds(&report),
            vec![NotifyKind::Daily, NotifyKind::Weekly, NotifyKind::Monthly]
        );
        assert_eq!(mailer.sent_count(), 3);
        assert!(mailer.sent().iter().all(|m| m.to == "me@example.com"));
    }

    #[tokio::test]
    async fn test_one_minute_later_fires_none() {
        let (sched, mailer) = scheduler(vec![]);
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 1, 0).unwrap();

        let report = sched.evaluate(now).await;
        assert!(report.is_quiet());
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_triggers_use_local_time() {
        let mailer = Arc::new(MemoryMailer::new());
        let settings = SchedulerSettings {
            tz: chrono_tz::Asia::Tokyo,
            ..SchedulerSettings::default()
        };
        let sched =
            PeriodicScheduler::new(settings, Arc::new(MemoryCalendar::new()), mailer.clone());

        // 00:00 UTC on Monday 2026-06-01 is 09:00 in Tokyo
        let report = sched
            .evaluate(Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap())
            .await;
        assert_eq!(report.sent.len(), 3);
    }

    #[tokio::test]
    async fn test_daily_only_on_ordinary_day() {
        let (sched, _) = scheduler(vec![]);
        // Wednesday the 3rd
        let report = sched
            .evaluate(Utc.with_ymd_and_hms(2026, 6, 3, 9, 0, 0).unwrap())
            .await;
        assert_eq!(kinds(&report), vec![NotifyKind::Daily]);
    }

    #[tokio::test]
    async fn test_monday_not_first_skips_monthly() {
        let (sched, _) = scheduler(vec![]);
        // Monday the 8th
        let report = sched
            .evaluate(Utc.with_ymd_and_hms(2026, 6, 8, 9, 0, 0).unwrap())
            .await;
        assert_eq!(kinds(&report), vec![NotifyKind::Daily, NotifyKind::Weekly]);
    }

    #[tokio::test]
    async fn test_first_not_monday_skips_weekly() {
        let (sched, _) = scheduler(vec![]);
        // Wednesday 2026-07-01
        let report = sched
            .evaluate(Utc.with_ymd_and_hms(2026, 7, 1, 9, 0, 0).unwrap())
            .await;
        assert_eq!(kinds(&report), vec![NotifyKind::Daily, NotifyKind::Monthly]);
    }

    #[tokio::test]
    async fn test_mailer_failure_does_not_stop_other_checks() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();
        let mailer = Arc::new(DigestRejectingMailer::default());
        let calendar = MemoryCalendar::with_events(vec![event("standup", now + Duration::minutes(5))])
            .pinned_at(now);
        let sched = PeriodicScheduler::new(
            SchedulerSettings::default(),
            Arc::new(calendar),
            mailer.clone(),
        );

        let report = sched.evaluate(now).await;
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].starts_with("Daily"));
        assert!(report.failures[0].contains("550 mailbox unavailable"));
        assert_eq!(
            kinds(&report),
            vec![NotifyKind::MeetingReminder, NotifyKind::Weekly, NotifyKind::Monthly]
        );
        assert_eq!(mailer.delivered.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_daily_lists_only_todays_meetings() {
        let now = Utc.with_ymd_and_hms(2026, 6, 3, 9, 0, 0).unwrap();
        let (sched, mailer) = scheduler_at(now, vec![
            event("Lunch", now + Duration::hours(3)),
            event("Tomorrow", now + Duration::days(1)),
        ]);

        sched.evaluate(now).await;
        let body = &mailer.sent()[0].body;
        assert!(body.contains("• Lunch at 12:00"));
        assert!(!body.contains("Tomorrow at"));
    }

    #[tokio::test]
    async fn test_upcoming_window() {
        let now = Utc.with_ymd_and_hms(2026, 6, 3, 14, 7, 0).unwrap();
        let (sched, mailer) = scheduler_at(now, vec![
            event("soon", now + Duration::minutes(10)),
            event("edge", now + Duration::minutes(15)),
            event("later", now + Duration::minutes(16)),
            event("started", now - Duration::minutes(1)),
            event("now", now),
        ]);

        let report = sched.evaluate(now).await;
        assert_eq!(report.sent.len(), 2);
        let bodies: Vec<_> = mailer.sent().into_iter().map(|m| m.body).collect();
        assert!(bodies[0].contains("Meeting: soon"));
        assert!(bodies[1].contains("Meeting: edge"));
    }

    #[tokio::test]
    async fn test_reminder_repeats_each_pass() {
        let now = Utc.with_ymd_and_hms(2026, 6, 3, 14, 7, 0).unwrap();
        let (sched, mailer) = scheduler_at(now, vec![event("sync", now + Duration::minutes(10))]);

        sched.evaluate(now).await;
        sched.evaluate(now + Duration::minutes(1)).await;
        assert_eq!(mailer.sent_count(), 2);
    }

    #[tokio::test]
    async fn test_calendar_failure_is_isolated() {
        let mailer = Arc::new(MemoryMailer::new());
        let sched = PeriodicScheduler::new(
            SchedulerSettings::default(),
            Arc::new(BrokenCalendar),
            mailer.clone(),
        );

        let report = sched
            .evaluate(Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap())
            .await;
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.sent.len(), 3);
        assert!(!mailer.sent()[0].body.contains("Today's Meetings"));
    }

    #[tokio::test]
    async fn test_unparsable_daily_time_never_fires() {
        let mut config = TaskpilotConfig::default();
        config.scheduler.daily_reminder_time = "nine".into();
        let settings = SchedulerSettings::from_config(&config).unwrap();
        assert!(settings.daily_at.is_none());

        let mailer = Arc::new(MemoryMailer::new());
        let sched =
            PeriodicScheduler::new(settings, Arc::new(MemoryCalendar::new()), mailer.clone());
        let report = sched
            .evaluate(Utc.with_ymd_and_hms(2026, 6, 3, 9, 0, 0).unwrap())
            .await;
        assert!(report.sent.is_empty());
    }

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let (sched, _) = scheduler(vec![]);
        assert_eq!(sched.state(), SchedulerState::Stopped);

        sched.start().unwrap();
        assert_eq!(sched.state(), SchedulerState::Running);
        assert!(matches!(sched.start(), Err(PilotError::Scheduler(_))));

        sched.stop().await.unwrap();
        assert_eq!(sched.state(), SchedulerState::Stopped);
        assert!(matches!(sched.stop().await, Err(PilotError::Scheduler(_))));

        // Restart after a clean stop is allowed.
        sched.start().unwrap();
        sched.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_loop_runs_immediate_pass() {
        let soon = Utc::now() + Duration::minutes(5);
        let (sched, mailer) = scheduler(vec![event("imminent", soon)]);

        sched.start().unwrap();
        for _ in 0..100 {
            if mailer.sent_count() > 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        sched.stop().await.unwrap();

        assert!(mailer.sent().iter().any(|m| m.body.contains("Meeting: imminent")));
    }
}
