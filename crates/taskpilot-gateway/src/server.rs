//! HTTP server implementation using Axum.

use axum::{
    Router,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use taskpilot_agent::Agent;
use taskpilot_core::config::GatewayConfig;
use taskpilot_scheduler::PeriodicScheduler;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for the gateway server.
pub struct AppState {
    /// Task engine: classifier, extractors, router and text generator.
    pub agent: Arc<Agent>,
    /// Background scheduler, reported by `/status`.
    pub scheduler: Arc<PeriodicScheduler>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(agent: Arc<Agent>, scheduler: Arc<PeriodicScheduler>) -> Self {
        Self {
            agent,
            scheduler,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    build_router_from_arc(Arc::new(state))
}

pub fn build_router_from_arc(shared: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/v1/tasks", post(super::routes::process_task))
        .route("/api/v1/nlp", post(super::routes::process_command))
        // Legacy paths
        .route("/schedule", post(super::routes::process_task))
        .route("/email", post(super::routes::process_task))
        .route("/nlp", post(super::routes::process_command));

    let public = Router::new()
        .route("/health", get(super::routes::health_check))
        .route("/status", get(super::routes::status));

    api.merge(public)
        .layer(
            CorsLayer::new()
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers(Any)
                .allow_origin(Any)
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Serve until `shutdown` resolves.
pub async fn start<F>(config: &GatewayConfig, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Gateway server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use chrono_tz::Tz;
    use taskpilot_channels::{MemoryCalendar, MemoryMailer};
    use taskpilot_providers::OfflineProvider;
    use taskpilot_scheduler::SchedulerSettings;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<MemoryCalendar>) {
        let calendar = Arc::new(MemoryCalendar::new());
        let mailer = Arc::new(MemoryMailer::new());
        let agent = Agent::new(
            Arc::new(OfflineProvider::new()),
            calendar.clone(),
            mailer.clone(),
            "me@example.com",
            Tz::UTC,
        );
        let scheduler =
            PeriodicScheduler::new(SchedulerSettings::default(), calendar.clone(), mailer);
        let router = build_router(AppState::new(Arc::new(agent), Arc::new(scheduler)));
        (router, calendar)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_route() {
        let (app, _) = app();
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_schedule_alias_books_meeting() {
        let (app, calendar) = app();
        let resp = app
            .oneshot(post_json(
                "/schedule",
                r#"{"task": "Schedule a meeting with alice@example.com tomorrow about \"Q3 Planning\""}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["action"]["kind"], "meeting_scheduled");
        assert_eq!(calendar.scheduled()[0].title, "Q3 Planning");
    }

    #[tokio::test]
    async fn test_invalid_json_rejected() {
        let (app, calendar) = app();
        let resp = app
            .oneshot(post_json("/api/v1/tasks", "not json"))
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
        assert!(calendar.scheduled().is_empty());
    }

    #[tokio::test]
    async fn test_get_on_task_route_not_allowed() {
        let (app, _) = app();
        let resp = app
            .oneshot(Request::get("/api/v1/tasks").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
