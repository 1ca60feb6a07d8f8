//! # Taskpilot Gateway
//! HTTP surface over the task agent.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
