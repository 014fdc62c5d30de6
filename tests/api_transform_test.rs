//! Integration tests for the text transformation endpoint

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use copilot::ai::ModelError;
    use tower::util::ServiceExt;

    use crate::test_utils::{ScriptedClient, body_to_string, test_app};

    fn transform_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .uri("/api/ai/transform-text")
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// Tests a friendly rewrite is returned with lengths
    #[tokio::test]
    async fn it_transforms_text() {
        let client = ScriptedClient::new();
        client.push_completion("  Hi there! Happy to help with your order.  ");
        let app = test_app(Some(client.clone()));

        let response = app
            .oneshot(transform_request(serde_json::json!({
                "action": "more_friendly",
                "text": "Your order is delayed."
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = body_to_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            json["transformedText"],
            "Hi there! Happy to help with your order."
        );
        assert_eq!(json["action"], "more_friendly");
        assert_eq!(json["originalLength"], 22);
        assert_eq!(json["transformedLength"], 40);
        assert!(json.get("note").is_none());

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[1].content, "Your order is delayed.");
    }

    /// Tests a grammar fix that looks like a refusal falls back to the
    /// original text
    #[tokio::test]
    async fn it_keeps_original_text_on_grammar_refusal() {
        let client = ScriptedClient::new();
        client.push_completion("I'm sorry, but I can't help with that.");
        let app = test_app(Some(client));

        let response = app
            .oneshot(transform_request(serde_json::json!({
                "action": "fix_grammar",
                "text": "we has shipped you're package"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = body_to_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["transformedText"], "we has shipped you're package");
        assert!(json["note"].is_string());
    }

    /// Tests missing fields are rejected before calling the model
    #[tokio::test]
    async fn it_rejects_missing_fields() {
        let client = ScriptedClient::new();
        let app = test_app(Some(client.clone()));

        let response = app
            .oneshot(transform_request(serde_json::json!({ "action": "rephrase" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("Missing required fields: action and text"));
        assert!(client.requests().is_empty());
    }

    /// Tests unknown actions are rejected
    #[tokio::test]
    async fn it_rejects_unknown_action() {
        let app = test_app(Some(ScriptedClient::new()));

        let response = app
            .oneshot(transform_request(serde_json::json!({
                "action": "shout",
                "text": "hello"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("Invalid action: shout"));
    }

    /// Tests text over the length limit is rejected
    #[tokio::test]
    async fn it_rejects_text_that_is_too_long() {
        let app = test_app(Some(ScriptedClient::new()));

        let response = app
            .oneshot(transform_request(serde_json::json!({
                "action": "rephrase",
                "text": "a".repeat(5001)
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("Text too long (max 5000 characters)"));
    }

    /// Tests a body that isn't JSON gets a format error
    #[tokio::test]
    async fn it_rejects_malformed_json() {
        let app = test_app(Some(ScriptedClient::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/ai/transform-text")
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("Invalid request format"));
    }

    /// Tests model failures map to the per-action error message
    #[tokio::test]
    async fn it_returns_action_specific_error_on_model_failure() {
        let client = ScriptedClient::new();
        client.push_completion_error(ModelError::Provider("upstream down".to_string()));
        let app = test_app(Some(client));

        let response = app
            .oneshot(transform_request(serde_json::json!({
                "action": "translate",
                "text": "Thanks for reaching out"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_to_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"], "Error translating text to Spanish");
        // Details are only included in development
        assert!(json.get("details").is_none());
    }

    /// Tests a failed rephrase retry fails the request instead of
    /// returning the unchanged first answer
    #[tokio::test]
    async fn it_fails_when_the_rephrase_retry_times_out() {
        let client = ScriptedClient::new();
        client.push_completion("The quick brown fox jumps.");
        client.push_completion_error(ModelError::Timeout);
        let app = test_app(Some(client.clone()));

        let response = app
            .oneshot(transform_request(serde_json::json!({
                "action": "rephrase",
                "text": "The quick brown fox jumps."
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_to_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"], "Error rephrasing text");
        assert_eq!(client.requests().len(), 2);
    }

    /// Tests the endpoint is unavailable without a model
    #[tokio::test]
    async fn it_is_unavailable_without_a_model() {
        let app = test_app(None);

        let response = app
            .oneshot(transform_request(serde_json::json!({
                "action": "rephrase",
                "text": "hello"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("AI service unavailable"));
    }
}
