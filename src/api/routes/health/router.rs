//! Router for the health check

use axum::{Json, Router, extract::State, routing::get};

use super::public::HealthResponse;
use crate::api::public::timestamp;
use crate::api::state::SharedState;

async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: String::from("ok"),
        llm_initialized: state.llm_initialized(),
        timestamp: timestamp(),
    })
}

/// Create the health router. Mounted at the root rather than under
/// `/api` so it stays reachable by load balancers.
pub fn router() -> Router<SharedState> {
    Router::new().route("/health", get(health))
}
