//! API routes module

pub mod ai;
pub mod health;

use axum::Router;

use crate::api::state::SharedState;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Copilot chat and text transformation routes
        .nest("/ai", ai::router())
}
