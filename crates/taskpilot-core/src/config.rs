//! Taskpilot configuration system.
//!
//! Loaded from `~/.taskpilot/config.toml` (missing file → defaults), then
//! overridden by environment variables so container deployments can run
//! without a file at all.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PilotError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskpilotConfig {
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

impl TaskpilotConfig {
    /// Load config from the default path, falling back to defaults.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PilotError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| PilotError::Config(format!("Failed to parse config: {e}")))
    }

    /// Expand `~` in a user-supplied path.
    pub fn expand_path(p: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(p).to_string())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Taskpilot home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".taskpilot")
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (the process env in production).
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("USER_EMAIL") {
            self.user.email = v;
        }
        if let Some(v) = get("TIMEZONE") {
            self.user.timezone = v;
        }
        if let Some(v) = get("DAILY_REMINDER_TIME") {
            self.scheduler.daily_reminder_time = v;
        }
        if let Some(v) = get("MEETING_REMINDER_MINUTES") {
            match v.parse() {
                Ok(n) => self.scheduler.meeting_reminder_minutes = n,
                Err(_) => tracing::warn!("Ignoring MEETING_REMINDER_MINUTES={v}: not a number"),
            }
        }
        if let Some(v) = get("SERVER_PORT") {
            match v.parse() {
                Ok(p) => self.gateway.port = p,
                Err(_) => tracing::warn!("Ignoring SERVER_PORT={v}: not a port"),
            }
        }
        if let Some(v) = get("GOOGLE_CALENDAR_API_KEY") {
            self.calendar.api_key = v;
        }
        if let Some(v) = get("GOOGLE_CALENDAR_URL") {
            self.calendar.base_url = v;
        }
        if let Some(v) = get("CALENDAR_ID") {
            self.calendar.calendar_id = v;
        }
        if let Some(v) = get("SMTP_HOST") {
            self.email.smtp_host = v;
        }
        if let Some(v) = get("SMTP_PORT") {
            match v.parse() {
                Ok(p) => self.email.smtp_port = p,
                Err(_) => tracing::warn!("Ignoring SMTP_PORT={v}: not a port"),
            }
        }
        if let Some(v) = get("SMTP_USERNAME") {
            self.email.username = v;
        }
        if let Some(v) = get("SMTP_PASSWORD") {
            self.email.password = v;
        }
        if let Some(v) = get("FROM_EMAIL") {
            self.email.from_email = v;
        }
        if let Some(v) = get("FROM_NAME") {
            self.email.from_name = v;
        }
        if let Some(v) = get("LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Some(v) = get("LLM_API_KEY").or_else(|| get("GEMINI_API_KEY")) {
            self.llm.api_key = v;
        }
        if let Some(v) = get("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = get("LLM_ENDPOINT") {
            self.llm.endpoint = v;
        }
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.timezone()?;
        if parse_hhmm(&self.scheduler.daily_reminder_time).is_none() {
            return Err(PilotError::Config(format!(
                "daily_reminder_time must be HH:MM, got '{}'",
                self.scheduler.daily_reminder_time
            )));
        }
        if self.scheduler.meeting_reminder_minutes == 0 {
            return Err(PilotError::Config(
                "meeting_reminder_minutes must be greater than zero".into(),
            ));
        }
        if self.scheduler.tick_secs == 0 {
            return Err(PilotError::Config("tick_secs must be greater than zero".into()));
        }
        Ok(())
    }

    /// The configured time zone.
    pub fn timezone(&self) -> Result<Tz> {
        self.user
            .timezone
            .parse::<Tz>()
            .map_err(|e| PilotError::Config(format!("Unknown timezone '{}': {e}", self.user.timezone)))
    }
}

/// Parse "HH:MM" into (hour, minute).
pub fn parse_hhmm(s: &str) -> Option<(u32, u32)> {
    let (h, m) = s.trim().split_once(':')?;
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}

/// The person who receives notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_user_email")]
    pub email: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_user_email() -> String { "me@example.com".into() }
fn default_timezone() -> String { "UTC".into() }

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            email: default_user_email(),
            timezone: default_timezone(),
        }
    }
}

/// Background loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_daily_reminder_time")]
    pub daily_reminder_time: String,
    #[serde(default = "default_meeting_reminder_minutes")]
    pub meeting_reminder_minutes: u32,
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
}

fn bool_true() -> bool { true }
fn default_daily_reminder_time() -> String { "09:00".into() }
fn default_meeting_reminder_minutes() -> u32 { 15 }
fn default_tick_secs() -> u64 { 60 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_reminder_time: default_daily_reminder_time(),
            meeting_reminder_minutes: default_meeting_reminder_minutes(),
            tick_secs: default_tick_secs(),
        }
    }
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 { 8080 }
fn default_host() -> String { "127.0.0.1".into() }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Google Calendar access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Bearer token. Empty → in-memory calendar.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_calendar_url")]
    pub base_url: String,
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
}

fn default_calendar_url() -> String { "https://www.googleapis.com/calendar/v3".into() }
fn default_calendar_id() -> String { "primary".into() }

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_calendar_url(),
            calendar_id: default_calendar_id(),
        }
    }
}

/// Outgoing mail (SMTP).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Empty → in-memory mailer that only logs.
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_user_email")]
    pub from_email: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_smtp_port() -> u16 { 587 }
fn default_from_name() -> String { "AI Assistant".into() }

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from_email: default_user_email(),
            from_name: default_from_name(),
        }
    }
}

/// Text-generation provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    /// Empty → offline provider (unless the provider needs no key).
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: String,
    /// Overrides the registry base URL.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_provider() -> String { "gemini".into() }
fn default_llm_timeout() -> u64 { 30 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            api_key: String::new(),
            model: String::new(),
            endpoint: String::new(),
            timeout_secs: default_llm_timeout(),
        }
    }
}
