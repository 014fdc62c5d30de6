use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use http::{HeaderValue, Method, header};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::public::ApiError;
use super::routes;
use crate::api::state::{AppState, SharedState};
use crate::core::AppConfig;
use crate::jobs::{EvictIdleSessions, spawn_periodic_job};

const MAX_BODY_BYTES: usize = 1024 * 1024;

async fn not_found() -> ApiError {
    ApiError::not_found()
}

fn cors(frontend_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match frontend_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(e)) => {
            tracing::warn!("Invalid frontend origin, allowing any origin: {}", e);
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

pub fn app(shared_state: SharedState) -> Router {
    let cors = cors(shared_state.config.frontend_origin.as_deref());

    Router::new()
        .merge(routes::health::router())
        // API routes
        .nest("/api", routes::router())
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::clone(&shared_state))
}

// Run the server
pub async fn serve(host: String, port: String, config: AppConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // axum logs rejections from built-in extractors with the `axum::rejection`
                // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
                format! {
                    "{}=debug,tower_http=debug,axum::rejection=trace",
                    env!("CARGO_CRATE_NAME")
                }
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app_state = AppState::from_config(config);
    if !app_state.llm_initialized() {
        tracing::warn!("AI functionality will be limited");
    }
    let sessions = Arc::clone(&app_state.sessions);
    let shared_state = Arc::new(app_state);
    let app = app(Arc::clone(&shared_state));

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;

    tracing::info!("Server running on {}", listener.local_addr()?);

    // Idle sessions are swept in the background for as long as the
    // server runs
    spawn_periodic_job(sessions, EvictIdleSessions);

    axum::serve(listener, app).await?;
    Ok(())
}
