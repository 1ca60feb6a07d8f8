//! # Taskpilot Scheduler
//!
//! Background loop that emails the user on a clock:
//! - daily digest at the configured local time
//! - a reminder for every meeting starting within the reminder window
//! - weekly summary on Mondays and monthly summary on the 1st, both at 09:00
//!
//! ```text
//! PeriodicScheduler (tokio interval, oneshot cancel)
//!   └── evaluate(now)
//!         ├── Calendar::upcoming_events
//!         └── Mailer::send_email ← notify templates
//! ```

pub mod engine;
pub mod notify;

pub use engine::{PassReport, PeriodicScheduler, SchedulerSettings, SchedulerState};
pub use notify::{Notification, NotifyKind};
