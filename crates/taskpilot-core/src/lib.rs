//! # Taskpilot Core
//!
//! Shared vocabulary for every Taskpilot crate: the task/event data model,
//! the collaborator traits (calendar, mail, text generation), configuration
//! and the error type.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::TaskpilotConfig;
pub use error::{PilotError, Result};
pub use traits::{Calendar, Mailer, TextGenerator};
pub use types::{Event, TaskRequest, TaskType};
