//! Streams copilot chat turns from the model to the caller and
//! records completed exchanges in the session history.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::BoxStream;
use handlebars::RenderError;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::ai::model::{ModelError, ModelRequest, SharedModelClient};
use crate::ai::prompt;
use crate::chat::session::{ConversationMessage, SessionStore};
use crate::openai::{Message, Role};

pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful AI assistant for a customer support dashboard.
Follow these rules:
1. Be concise and professional
2. Only answer support-related queries
3. Base responses on conversation context when available";

pub const DEFAULT_CONTEXT: &str = "No specific context provided";

/// One unit of data pushed to a chat caller. Serializes to the JSON
/// payload of an SSE `data:` line.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StreamEvent {
    Chunk {
        chunk: String,
    },
    End {
        #[serde(rename = "endOfStream")]
        end_of_stream: bool,
        #[serde(rename = "fullResponse")]
        full_response: String,
    },
    Error {
        error: String,
        message: String,
        #[serde(rename = "endOfStream")]
        end_of_stream: bool,
    },
}

impl StreamEvent {
    pub fn chunk(chunk: &str) -> Self {
        StreamEvent::Chunk {
            chunk: chunk.to_string(),
        }
    }

    pub fn end(full_response: &str) -> Self {
        StreamEvent::End {
            end_of_stream: true,
            full_response: full_response.to_string(),
        }
    }

    pub fn failure(err: &ModelError) -> Self {
        StreamEvent::Error {
            error: "Streaming error".to_string(),
            message: err.to_string(),
            end_of_stream: true,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Chunk { .. })
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Missing required parameters: message and sessionId")]
    MissingParameters,
    #[error("Failed to build chat prompt: {0}")]
    Prompt(#[from] RenderError),
}

/// A request for the next turn of a chat session.
#[derive(Clone, Debug)]
pub struct ChatTurn {
    pub session_id: String,
    pub message: String,
    pub context: Option<String>,
}

pub struct ChatRelay {
    sessions: Arc<SessionStore>,
    client: SharedModelClient,
    system_message: String,
}

impl ChatRelay {
    pub fn new(sessions: Arc<SessionStore>, client: SharedModelClient, system_message: &str) -> Self {
        Self {
            sessions,
            client,
            system_message: system_message.to_string(),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    fn build_prompt(
        &self,
        history: &[ConversationMessage],
        turn: &ChatTurn,
    ) -> Result<Vec<Message>, ChatError> {
        let context = turn
            .context
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_CONTEXT);

        let mut messages = Vec::with_capacity(history.len() + 3);
        messages.push(Message::new(Role::System, &self.system_message));
        messages.extend(history.iter().map(ConversationMessage::to_message));
        messages.push(Message::new(Role::System, &prompt::chat_context(context)?));
        messages.push(Message::new(Role::User, &turn.message));
        Ok(messages)
    }

    /// Run the next turn of a chat session.
    ///
    /// Validation happens up front so callers can reject the request
    /// before committing to a stream. The returned stream is lazy: the
    /// model isn't called until it's first polled. It yields `Chunk`
    /// events followed by exactly one terminal event. The exchange is
    /// appended to the session only when the model finishes
    /// successfully. Cancelling `cancel`, or dropping the stream, aborts
    /// the model call and discards the partial response.
    pub fn stream_chat(
        &self,
        turn: ChatTurn,
        cancel: CancellationToken,
    ) -> Result<BoxStream<'static, StreamEvent>, ChatError> {
        if turn.session_id.is_empty() || turn.message.is_empty() {
            return Err(ChatError::MissingParameters);
        }

        let session = self.sessions.get_or_create(&turn.session_id);
        let messages = self.build_prompt(&session.history(), &turn)?;
        let client = Arc::clone(&self.client);

        let stream = async_stream::stream! {
            let opened = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = client.stream(ModelRequest::new(messages)) => Some(result),
            };
            let mut chunks = match opened {
                Some(Ok(chunks)) => chunks,
                Some(Err(e)) => {
                    tracing::error!("Chat streaming error for session {}: {}", session.id(), e);
                    yield StreamEvent::failure(&e);
                    return;
                }
                None => {
                    tracing::info!("Chat turn cancelled for session {}", session.id());
                    return;
                }
            };

            let mut full_response = String::new();
            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    next = chunks.next() => Some(next),
                };
                match next {
                    Some(Some(Ok(chunk))) => {
                        if chunk.is_empty() {
                            continue;
                        }
                        full_response.push_str(&chunk);
                        yield StreamEvent::Chunk { chunk };
                    }
                    Some(Some(Err(e))) => {
                        tracing::error!("Chat streaming error for session {}: {}", session.id(), e);
                        yield StreamEvent::failure(&e);
                        return;
                    }
                    Some(None) => break,
                    None => {
                        tracing::info!(
                            "Chat turn cancelled for session {}, discarding partial response",
                            session.id()
                        );
                        return;
                    }
                }
            }

            session.append_exchange(&turn.message, &full_response);
            tracing::debug!(
                "Session {} now has {} messages",
                session.id(),
                session.len()
            );
            yield StreamEvent::end(&full_response);
        };

        Ok(stream.boxed())
    }
}
