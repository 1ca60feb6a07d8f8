//! # Taskpilot Agent
//! Turns a natural-language task into exactly one collaborator action.
//!
//! Flow: text generator (advisory reply) → classifier → extractors → router.

pub mod classify;
pub mod extract;
pub mod router;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskpilot_core::error::{PilotError, Result};
use taskpilot_core::traits::{Calendar, Mailer, TextGenerator};
use taskpilot_core::types::TaskRequest;

pub use classify::{classify, parse_task};
pub use router::{Action, TaskRouter};

/// Result of one `process_task` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task: TaskRequest,
    /// Reply from the text generator; informational only.
    pub advisory: String,
    pub action: Action,
}

/// Task-processing facade shared by the gateway and the CLI.
pub struct Agent {
    generator: Arc<dyn TextGenerator>,
    router: TaskRouter,
    tz: Tz,
}

impl Agent {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        calendar: Arc<dyn Calendar>,
        mailer: Arc<dyn Mailer>,
        user_email: impl Into<String>,
        tz: Tz,
    ) -> Self {
        Self {
            generator,
            router: TaskRouter::new(calendar, mailer, user_email, tz),
            tz,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Process one task string against the current wall clock.
    pub async fn process_task(&self, raw: &str) -> Result<TaskOutcome> {
        self.process_task_at(raw, Utc::now()).await
    }

    /// Process one task string with an explicit "now".
    ///
    /// A text-generator failure aborts before classification, so no
    /// collaborator is called.
    pub async fn process_task_at(&self, raw: &str, now: DateTime<Utc>) -> Result<TaskOutcome> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(PilotError::InvalidInput("task must not be empty".into()));
        }

        tracing::info!("📥 Task: {text}");
        let advisory = self.generator.process_command(text).await?;
        tracing::debug!("Advisory reply from {}: {advisory}", self.generator.name());

        let task = parse_task(text, now, self.tz);
        let action = self.router.route(&task).await?;
        tracing::info!("✅ {} task handled", task.task_type);

        Ok(TaskOutcome {
            task,
            advisory,
            action,
        })
    }

    /// Pass text straight to the text generator.
    pub async fn process_command(&self, raw: &str) -> Result<String> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(PilotError::InvalidInput("command must not be empty".into()));
        }
        self.generator.process_command(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use taskpilot_channels::{MemoryCalendar, MemoryMailer};
    use taskpilot_core::types::TaskType;
    use taskpilot_providers::OfflineProvider;

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        fn name(&self) -> &str {
            "failing"
        }

        async fn process_command(&self, _text: &str) -> Result<String> {
            Err(PilotError::Provider("quota exceeded".into()))
        }
    }

    struct RejectingCalendar;

    #[async_trait]
    impl Calendar for RejectingCalendar {
        fn name(&self) -> &str {
            "rejecting"
        }

        async fn schedule_meeting(
            &self,
            _attendees: &[String],
            _start: DateTime<Utc>,
            _duration_minutes: u32,
            _title: &str,
        ) -> Result<()> {
            Err(PilotError::Calendar("401 invalid credentials".into()))
        }

        async fn upcoming_events(&self) -> Result<Vec<taskpilot_core::types::Event>> {
            Ok(vec![])
        }
    }

    struct RejectingMailer;

    #[async_trait]
    impl Mailer for RejectingMailer {
        fn name(&self) -> &str {
            "rejecting"
        }

        async fn send_email(&self, _to: &str, _subject: &str, _body: &str) -> Result<()> {
            Err(PilotError::Email("535 authentication failed".into()))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, 10, 37, 12).unwrap()
    }

    fn agent_with(
        generator: Arc<dyn TextGenerator>,
    ) -> (Agent, Arc<MemoryCalendar>, Arc<MemoryMailer>) {
        let calendar = Arc::new(MemoryCalendar::new());
        let mailer = Arc::new(MemoryMailer::new());
        let agent = Agent::new(
            generator,
            calendar.clone(),
            mailer.clone(),
            "me@example.com",
            Tz::UTC,
        );
        (agent, calendar, mailer)
    }

    #[tokio::test]
    async fn test_schedule_scenario() {
        let (agent, calendar, _) = agent_with(Arc::new(OfflineProvider::new()));
        let outcome = agent
            .process_task_at(
                r#"Schedule a meeting with alice@example.com tomorrow at 2pm for 1 hour about "Q3 Planning""#,
                now(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.task.task_type, TaskType::Schedule);
        assert!(outcome.advisory.contains("Q3 Planning"));
        let meeting = &calendar.scheduled()[0];
        assert_eq!(meeting.title, "Q3 Planning");
        assert_eq!(meeting.attendees, vec!["alice@example.com"]);
        assert_eq!(meeting.start, Utc.with_ymd_and_hms(2026, 3, 10, 14, 0, 0).unwrap());
        assert_eq!(meeting.duration_minutes, 60);
    }

    #[tokio::test]
    async fn test_email_scenario() {
        let (agent, _, mailer) = agent_with(Arc::new(OfflineProvider::new()));
        agent
            .process_task_at("Send an email to bob@example.com saying the report is ready", now())
            .await
            .unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "bob@example.com");
        assert_eq!(sent[0].subject, "Message from AI Assistant");
        assert_eq!(sent[0].body, "the report is ready");
    }

    #[tokio::test]
    async fn test_general_scenario_routes_nowhere() {
        let (agent, calendar, mailer) = agent_with(Arc::new(OfflineProvider::new()));
        let outcome = agent
            .process_task_at("What's the weather", now())
            .await
            .unwrap();

        assert_eq!(outcome.task.title, "What's the weather");
        assert_eq!(outcome.action, Action::None);
        assert!(calendar.scheduled().is_empty());
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_generator_failure_stops_routing() {
        let (agent, calendar, mailer) = agent_with(Arc::new(FailingGenerator));
        let err = agent
            .process_task_at("schedule a meeting tomorrow", now())
            .await
            .unwrap_err();

        assert!(matches!(err, PilotError::Provider(_)));
        assert!(calendar.scheduled().is_empty());
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let (agent, _, _) = agent_with(Arc::new(OfflineProvider::new()));
        assert!(matches!(
            agent.process_task("   ").await,
            Err(PilotError::InvalidInput(_))
        ));
        assert!(matches!(
            agent.process_command("").await,
            Err(PilotError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_process_command_passthrough() {
        let (agent, _, mailer) = agent_with(Arc::new(OfflineProvider::new()));
        let reply = agent.process_command("send email to x@y.com").await.unwrap();
        assert!(reply.contains("send email to x@y.com"));
        assert_eq!(mailer.sent_count(), 0);
    }

    #[test]
    fn test_outcome_serializes_action_kind() {
        let outcome = TaskOutcome {
            task: TaskRequest::new(TaskType::General, now()),
            advisory: "ok".into(),
            action: Action::None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["action"]["kind"], "none");
        assert_eq!(json["task"]["type"], "general");
    }

    #[tokio::test]
    async fn test_collaborator_errors_reach_caller_unchanged() {
        let agent = Agent::new(
            Arc::new(OfflineProvider::new()),
            Arc::new(RejectingCalendar),
            Arc::new(RejectingMailer),
            "me@example.com",
            Tz::UTC,
        );

        let err = agent
            .process_task_at("Schedule a meeting with alice@example.com tomorrow", now())
            .await
            .unwrap_err();
        assert!(matches!(err, PilotError::Calendar(ref m) if m == "401 invalid credentials"));

        let err = agent
            .process_task_at("Send an email to bob@example.com saying hi", now())
            .await
            .unwrap_err();
        assert!(matches!(err, PilotError::Email(ref m) if m == "535 authentication failed"));
    }
}
