use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::chat::DEFAULT_SYSTEM_MESSAGE;

const DEFAULT_PORT: &str = "3001";
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("COPILOT_LLM_API_KEY is not defined")]
    MissingCredential,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: String,
    // None allows any origin
    pub frontend_origin: Option<String>,
    pub llm_api_hostname: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub model_timeout: Duration,
    pub session_ttl: Duration,
    pub system_message: String,
    // Include error details in responses
    pub development: bool,
}

impl AppConfig {
    /// Build the config from an arbitrary variable lookup so it can
    /// be constructed without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("PORT").unwrap_or_else(|| DEFAULT_PORT.to_string());
        let frontend_origin = lookup("COPILOT_FRONTEND_ORIGIN")
            .filter(|origin| !origin.is_empty() && origin != "*");
        let llm_api_hostname = lookup("COPILOT_LLM_HOST")
            .unwrap_or_else(|| "https://api.openai.com".to_string());
        let llm_api_key = lookup("COPILOT_LLM_API_KEY")
            .or_else(|| lookup("OPENAI_API_KEY"))
            .or_else(|| lookup("GOOGLE_API_KEY"))
            .filter(|key| !key.trim().is_empty());
        let llm_model =
            lookup("COPILOT_LLM_MODEL").unwrap_or_else(|| "gpt-4.1-mini".to_string());
        let model_timeout = Duration::from_secs(
            lookup("COPILOT_MODEL_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MODEL_TIMEOUT_SECS),
        );
        let session_ttl = Duration::from_secs(
            lookup("COPILOT_SESSION_TTL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SESSION_TTL_SECS),
        );
        let system_message = lookup("COPILOT_SYSTEM_MESSAGE")
            .unwrap_or_else(|| DEFAULT_SYSTEM_MESSAGE.to_string());
        let development = lookup("COPILOT_ENV")
            .map(|v| v.eq_ignore_ascii_case("development"))
            .unwrap_or(false);

        Self {
            port,
            frontend_origin,
            llm_api_hostname,
            llm_api_key,
            llm_model,
            model_timeout,
            session_ttl,
            system_message,
            development,
        }
    }

    /// Returns the provider credential or an error if the AI
    /// features can't be enabled.
    pub fn require_api_key(&self) -> Result<&str, ConfigurationError> {
        self.llm_api_key
            .as_deref()
            .ok_or(ConfigurationError::MissingCredential)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.port, "3001");
        assert_eq!(config.frontend_origin, None);
        assert_eq!(config.llm_api_hostname, "https://api.openai.com");
        assert_eq!(config.model_timeout, Duration::from_secs(60));
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
        assert_eq!(config.system_message, DEFAULT_SYSTEM_MESSAGE);
        assert!(!config.development);
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigurationError::MissingCredential)
        ));
    }

    #[test]
    fn test_api_key_fallbacks() {
        let config = config_from(&[("GOOGLE_API_KEY", "google-key")]);
        assert_eq!(config.require_api_key().unwrap(), "google-key");

        let config = config_from(&[
            ("COPILOT_LLM_API_KEY", "primary"),
            ("OPENAI_API_KEY", "secondary"),
        ]);
        assert_eq!(config.require_api_key().unwrap(), "primary");

        let config = config_from(&[("COPILOT_LLM_API_KEY", "  ")]);
        assert!(config.llm_api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("COPILOT_FRONTEND_ORIGIN", "http://localhost:3000"),
            ("COPILOT_MODEL_TIMEOUT_SECS", "5"),
            ("COPILOT_SESSION_TTL_SECS", "not-a-number"),
            ("COPILOT_ENV", "Development"),
        ]);
        assert_eq!(config.port, "8080");
        assert_eq!(
            config.frontend_origin.as_deref(),
            Some("http://localhost:3000")
        );
        assert_eq!(config.model_timeout, Duration::from_secs(5));
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
        assert!(config.development);
    }

    #[test]
    fn test_wildcard_origin_allows_any() {
        let config = config_from(&[("COPILOT_FRONTEND_ORIGIN", "*")]);
        assert_eq!(config.frontend_origin, None);
    }
}
