//! Error taxonomy shared across the workspace.

use thiserror::Error;

/// Errors surfaced by Taskpilot components and collaborators.
#[derive(Debug, Error)]
pub enum PilotError {
    /// Configuration could not be read, parsed or validated.
    #[error("Config error: {0}")]
    Config(String),

    /// Transport-level HTTP failure (connect, timeout, decode).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Text-generation provider returned an error.
    #[error("Provider error: {0}")]
    Provider(String),

    /// A provider that needs a key was built without one.
    #[error("API key missing for provider '{0}'")]
    ApiKeyMissing(String),

    /// Calendar collaborator failure.
    #[error("Calendar error: {0}")]
    Calendar(String),

    /// Email collaborator failure.
    #[error("Email error: {0}")]
    Email(String),

    /// Caller supplied unusable input (e.g. an empty task string).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Periodic scheduler misuse (double start, stop while stopped).
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PilotError>;
