//! Collaborator traits: the narrow seams to the outside world.

pub mod calendar;
pub mod mailer;
pub mod provider;

pub use calendar::Calendar;
pub use mailer::Mailer;
pub use provider::TextGenerator;
