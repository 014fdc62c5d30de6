use std::sync::Arc;

use crate::ai::{SharedModelClient, Transformer};
use crate::chat::{ChatRelay, SessionStore};
use crate::core::AppConfig;
use crate::openai::OpenAiClient;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: AppConfig,
    pub sessions: Arc<SessionStore>,
    // Both are None when no model credential is configured
    pub relay: Option<ChatRelay>,
    pub transformer: Option<Transformer>,
}

impl AppState {
    pub fn new(config: AppConfig, client: Option<SharedModelClient>) -> Self {
        let sessions = Arc::new(SessionStore::new(config.session_ttl));
        let relay = client.as_ref().map(|client| {
            ChatRelay::new(
                Arc::clone(&sessions),
                Arc::clone(client),
                &config.system_message,
            )
        });
        let transformer = client.map(Transformer::new);

        Self {
            config,
            sessions,
            relay,
            transformer,
        }
    }

    /// Build the state with a client for the configured provider. A
    /// missing credential disables the AI endpoints but the server
    /// still starts.
    pub fn from_config(config: AppConfig) -> Self {
        let client = match OpenAiClient::from_config(&config) {
            Ok(client) => {
                tracing::info!("LLM initialized with model {}", config.llm_model);
                Some(Arc::new(client) as SharedModelClient)
            }
            Err(e) => {
                tracing::error!("LLM initialization failed: {}", e);
                None
            }
        };
        Self::new(config, client)
    }

    pub fn llm_initialized(&self) -> bool {
        self.relay.is_some() && self.transformer.is_some()
    }
}
