//! Calendar capability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::Event;

#[async_trait]
pub trait Calendar: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Create a meeting of `duration_minutes` starting at `start`.
    async fn schedule_meeting(
        &self,
        attendees: &[String],
        start: DateTime<Utc>,
        duration_minutes: u32,
        title: &str,
    ) -> Result<()>;

    /// Events for roughly the next seven days.
    async fn upcoming_events(&self) -> Result<Vec<Event>>;
}
