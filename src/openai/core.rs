use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::ai::model::{ChunkStream, ModelClient, ModelError, ModelRequest};
use crate::core::{AppConfig, ConfigurationError};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

// Some OpenAI compatible servers stream reasoning tokens separately
// from the content. Only content is forwarded to callers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Delta {
    Content { content: String },

    Reasoning { reasoning: String },

    Stop {},
}

#[derive(Debug, Deserialize)]
struct CompletionChunkChoice {
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    choices: Vec<CompletionChunkChoice>,
}

/// Client for any OpenAI compatible chat completions API.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_hostname: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(api_hostname: &str, api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_hostname: api_hostname.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigurationError> {
        let api_key = config.require_api_key()?;
        Ok(Self::new(
            &config.llm_api_hostname,
            api_key,
            &config.llm_model,
            config.model_timeout,
        ))
    }

    fn payload(&self, request: &ModelRequest, stream: bool) -> serde_json::Value {
        let mut payload = json!({
            "model": self.model,
            "messages": request.messages,
        });
        if let Some(temperature) = request.temperature {
            payload["temperature"] = json!(temperature);
        }
        if stream {
            payload["stream"] = json!(true);
        }
        payload
    }

    async fn send(&self, payload: &serde_json::Value) -> Result<reqwest::Response, ModelError> {
        let url = format!("{}/v1/chat/completions", self.api_hostname);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Provider(format!(
                "provider responded with {}: {}",
                status, body
            )));
        }
        Ok(response)
    }

    pub async fn completion(&self, request: &ModelRequest) -> Result<String, ModelError> {
        let payload = self.payload(request, false);
        let response: CompletionResponse = self.send(&payload).await?.json().await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::Provider("Missing choices field".to_string()))?
            .message
            .content
            .unwrap_or_default();
        Ok(content)
    }

    pub async fn completion_stream(&self, request: &ModelRequest) -> Result<ChunkStream, ModelError> {
        let payload = self.payload(request, true);
        let response = self.send(&payload).await?;
        let mut bytes = response.bytes_stream().boxed();

        let stream = async_stream::try_stream! {
            let mut buffer: Vec<u8> = Vec::new();

            'outer: while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(|e| {
                    if e.is_timeout() {
                        ModelError::Timeout
                    } else {
                        ModelError::Transport(e.to_string())
                    }
                })?;

                // Buffer raw bytes since SSE events and multi-byte
                // characters can both be split across frames.
                buffer.extend_from_slice(&chunk);

                for data in drain_events(&mut buffer)? {
                    if data == "[DONE]" {
                        break 'outer;
                    }

                    let parsed = serde_json::from_str::<CompletionChunk>(&data).map_err(|e| {
                        tracing::error!("Parsing completion chunk failed for {}\nError:{}", data, e);
                        ModelError::Provider(format!("Malformed completion chunk: {}", e))
                    })?;

                    // Usage-only chunks have no choices
                    let Some(choice) = parsed.choices.into_iter().next() else {
                        continue;
                    };

                    if let Delta::Content { content } = choice.delta {
                        if !content.is_empty() {
                            yield content;
                        }
                    }

                    if choice.finish_reason.is_some() {
                        break 'outer;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Remove every complete SSE event from `buffer` and return the
/// payloads of its `data:` lines. Incomplete trailing data is left in
/// the buffer for the next read.
fn drain_events(buffer: &mut Vec<u8>) -> Result<Vec<String>, ModelError> {
    let mut events = Vec::new();

    while let Some(event_end) = buffer.windows(2).position(|w| w == b"\n\n") {
        let event: Vec<u8> = buffer.drain(..event_end + 2).collect();
        let event = std::str::from_utf8(&event)
            .map_err(|e| ModelError::Transport(format!("Invalid UTF-8 in stream: {}", e)))?;

        for line in event.lines() {
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            // Data can sometimes be empty
            if !data.is_empty() {
                events.push(data.to_string());
            }
        }
    }

    Ok(events)
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn complete(&self, request: ModelRequest) -> Result<String, ModelError> {
        self.completion(&request).await
    }

    async fn stream(&self, request: ModelRequest) -> Result<ChunkStream, ModelError> {
        self.completion_stream(&request).await
    }
}
