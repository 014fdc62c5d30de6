//! Test utilities for integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{Router, body::Body};
use futures::stream;

use copilot::ai::model::{ChunkStream, ModelError};
use copilot::ai::{ModelClient, ModelRequest, SharedModelClient};
use copilot::api::{AppState, app};
use copilot::core::AppConfig;

enum Reply {
    Completion(Result<String, ModelError>),
    Stream(Vec<Result<String, ModelError>>),
}

/// A model client that plays back queued replies in order and records
/// every request it receives.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_completion(&self, text: &str) {
        self.push(Reply::Completion(Ok(text.to_string())));
    }

    pub fn push_completion_error(&self, err: ModelError) {
        self.push(Reply::Completion(Err(err)));
    }

    pub fn push_stream(&self, chunks: &[&str]) {
        self.push(Reply::Stream(
            chunks.iter().map(|c| Ok(c.to_string())).collect(),
        ));
    }

    pub fn push_stream_error(&self, chunks: &[&str], err: ModelError) {
        let mut items: Vec<_> = chunks.iter().map(|c| Ok(c.to_string())).collect();
        items.push(Err(err));
        self.push(Reply::Stream(items));
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    fn next(&self, request: ModelRequest) -> Option<Reply> {
        self.requests.lock().unwrap().push(request);
        self.replies.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn complete(&self, request: ModelRequest) -> Result<String, ModelError> {
        match self.next(request) {
            Some(Reply::Completion(result)) => result,
            _ => Err(ModelError::Provider("no scripted completion".to_string())),
        }
    }

    async fn stream(&self, request: ModelRequest) -> Result<ChunkStream, ModelError> {
        match self.next(request) {
            Some(Reply::Stream(items)) => Ok(Box::pin(stream::iter(items))),
            _ => Err(ModelError::Provider("no scripted stream".to_string())),
        }
    }
}

/// Creates a test application router. Passing `None` builds the app
/// the way it runs without a model credential.
pub fn test_app(client: Option<Arc<ScriptedClient>>) -> Router {
    let config = AppConfig::from_lookup(|_| None);
    let client = client.map(|c| c as SharedModelClient);
    let app_state = AppState::new(config, client);
    app(Arc::new(app_state))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not utf-8")
}
