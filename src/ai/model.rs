//! The seam between the copilot features and the hosted model.
//!
//! Everything that talks to the provider goes through `ModelClient` so
//! the transform pipeline and the chat relay can be exercised against
//! a scripted client in tests.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::openai::Message;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request timed out")]
    Timeout,
    #[error("model provider error: {0}")]
    Provider(String),
    #[error("stream transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ModelError::Timeout
        } else {
            ModelError::Provider(err.to_string())
        }
    }
}

/// A prompt to send to the model along with sampling options.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelRequest {
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
}

impl ModelRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Incremental content deltas in the order the model produced them.
pub type ChunkStream = BoxStream<'static, Result<String, ModelError>>;

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Run the prompt to completion and return the response content.
    async fn complete(&self, request: ModelRequest) -> Result<String, ModelError>;

    /// Start a streaming completion. Dropping the returned stream
    /// aborts the underlying request.
    async fn stream(&self, request: ModelRequest) -> Result<ChunkStream, ModelError>;
}

pub type SharedModelClient = Arc<dyn ModelClient>;
