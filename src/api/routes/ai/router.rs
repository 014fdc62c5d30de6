//! Router for the copilot AI API

use std::time::Duration;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, sse::Event, sse::KeepAlive, sse::Sse},
    routing::{get, post},
};
use axum_extra::extract::Query;
use tokio_stream::StreamExt as _;
use tokio_util::sync::CancellationToken;

use super::public;
use crate::ai::TransformError;
use crate::api::public::ApiError;
use crate::api::state::SharedState;
use crate::api::utils::DetectDisconnect;
use crate::chat::{ChatError, ChatTurn};

/// Stream the copilot's reply to a chat message as server-sent events
async fn chat_handler(
    State(state): State<SharedState>,
    Query(params): Query<public::ChatQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let relay = state.relay.as_ref().ok_or_else(ApiError::unavailable)?;

    let turn = ChatTurn {
        session_id: params.session_id.unwrap_or_default(),
        message: params.message.unwrap_or_default(),
        context: params.chat_context,
    };

    // Cancelled by `DetectDisconnect` when the client goes away so the
    // model call is aborted and the partial turn is discarded
    let cancel = CancellationToken::new();
    let events = relay
        .stream_chat(turn, cancel.clone())
        .map_err(|e| match e {
            ChatError::MissingParameters => ApiError::bad_request(&e.to_string()),
            ChatError::Prompt(_) => ApiError::internal("Error during chat streaming")
                .with_details(state.config.development.then(|| e.to_string())),
        })?;

    let sse_stream = events.map(|event| Event::default().json_data(&event));
    let wrapped_sse_stream = DetectDisconnect::new(sse_stream, cancel);

    let resp = Sse::new(wrapped_sse_stream)
        .keep_alive(
            KeepAlive::default()
                .text("keep-alive")
                .interval(Duration::from_secs(15)),
        )
        .into_response();

    Ok(resp)
}

fn transform_error(err: TransformError, development: bool) -> ApiError {
    if err.is_input_error() {
        return ApiError::bad_request(&err.to_string());
    }
    tracing::error!("Transformation error: {}", err);
    let message = err
        .action()
        .map(|action| action.failure_message())
        .unwrap_or("Internal server error");
    ApiError::internal(message).with_details(development.then(|| err.to_string()))
}

/// Rewrite text in the reply composer
async fn transform_handler(
    State(state): State<SharedState>,
    payload: Result<Json<public::TransformRequest>, JsonRejection>,
) -> Result<Json<public::TransformResponse>, ApiError> {
    let transformer = state
        .transformer
        .as_ref()
        .ok_or_else(ApiError::unavailable)?;

    let Json(payload) = payload.map_err(|e| {
        tracing::debug!("Rejected transform request body: {}", e);
        ApiError::bad_request("Invalid request format")
    })?;
    let text = payload.text.as_ref().and_then(|v| v.as_str());
    tracing::info!("Transform text called with action {:?}", payload.action);

    let outcome = transformer
        .transform_text(payload.action.as_deref(), text)
        .await
        .map_err(|e| transform_error(e, state.config.development))?;

    Ok(Json(outcome.into()))
}

/// Create the copilot AI router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/chat", get(chat_handler))
        .route("/transform-text", post(transform_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::TransformAction;
    use crate::ai::model::ModelError;
    use http::StatusCode;

    #[test]
    fn test_transform_error_statuses() {
        let err = transform_error(TransformError::TextTooLong, false);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = transform_error(
            TransformError::InvalidAction("shout".to_string()),
            false,
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = transform_error(
            TransformError::Model {
                action: TransformAction::Translate,
                source: ModelError::Provider("down".to_string()),
            },
            true,
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
