//! Single-shot text transformations for the reply composer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::heuristics::{GrammarVerdict, check_grammar_fix, same_text};
use crate::ai::model::{ModelError, ModelRequest, SharedModelClient};
use crate::ai::prompt;
use crate::ai::retry::RetryPolicy;
use crate::openai::{Message, Role};

pub const MAX_TEXT_LENGTH: usize = 5000;

const EMPTY_OUTPUT_NOTE: &str = "AI returned empty/invalid response, original text used.";

const REPHRASE_PROMPT: &str = "Rephrase the following text using different words while keeping the EXACT same meaning and tone. Do not change the formality level, style, or intent. Simply express the same idea with alternative wording. If the text is already clear and well-written, make minimal changes. Output only the rephrased text with no explanations.";

const TONE_OF_VOICE_PROMPT: &str = "Adjust ONLY the tone of the following text to be professional and suitable for business communication. Keep the same message, facts, and structure. Do not add or remove information. Only modify word choices and phrasing to sound more professional. Output only the tone-adjusted text.";

const MORE_FRIENDLY_PROMPT: &str = "Make the following text sound more friendly and warm while keeping it professional. Add friendly language, soften harsh words, and make it more approachable. Do not change the core message or remove important information. Output only the friendlier version.";

const MORE_FORMAL_PROMPT: &str = "Make the following text more formal and business-appropriate. Use professional language, remove casual expressions, and ensure proper business etiquette. Keep the same message and information. Do not make it overly complex. Output only the formal version.";

const FIX_GRAMMAR_PROMPT: &str = r#"You are a meticulous proofreading AI. Your sole task is to correct grammar and spelling errors in the text provided by the user.
Follow these instructions precisely:
1. Identify and correct ONLY grammatical errors and spelling mistakes.
2. Do NOT rephrase sentences or change the original wording unless it's to fix an error.
3. Do NOT alter the meaning, style, or tone of the text.
4. Make the absolute minimum number of changes necessary.
5. If the provided text contains no errors, return the original text verbatim.
6. Your entire response MUST consist of ONLY the corrected text. Do not include any other words, preambles, explanations, apologies, or any form of meta-commentary (e.g., do not say "Here is the corrected text:"). Do not use placeholders like '{correctedText}'.

Example 1:
User text: "he go to store yestaday and buyed bred"
Your corrected output: He went to the store yesterday and bought bread.

Example 2:
User text: "This sentence is perfectly fine."
Your corrected output: This sentence is perfectly fine.

Example 3:
User text: "its a cool day isnt it"
Your corrected output: It's a cool day, isn't it?

The user will now provide the text. Your output must be only the corrected version of that text."#;

const TRANSLATE_PROMPT: &str = "Translate the following text accurately to Spanish. Maintain the same tone, formality level, and meaning. Use appropriate Spanish grammar and natural phrasing. Do not add explanations or notes. Output only the Spanish translation. The user will now provide the text.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformAction {
    Rephrase,
    ToneOfVoice,
    MoreFriendly,
    MoreFormal,
    FixGrammar,
    Translate,
}

impl TransformAction {
    pub const ALL: [TransformAction; 6] = [
        TransformAction::Rephrase,
        TransformAction::ToneOfVoice,
        TransformAction::MoreFriendly,
        TransformAction::MoreFormal,
        TransformAction::FixGrammar,
        TransformAction::Translate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransformAction::Rephrase => "rephrase",
            TransformAction::ToneOfVoice => "tone_of_voice",
            TransformAction::MoreFriendly => "more_friendly",
            TransformAction::MoreFormal => "more_formal",
            TransformAction::FixGrammar => "fix_grammar",
            TransformAction::Translate => "translate",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            TransformAction::Rephrase => REPHRASE_PROMPT,
            TransformAction::ToneOfVoice => TONE_OF_VOICE_PROMPT,
            TransformAction::MoreFriendly => MORE_FRIENDLY_PROMPT,
            TransformAction::MoreFormal => MORE_FORMAL_PROMPT,
            TransformAction::FixGrammar => FIX_GRAMMAR_PROMPT,
            TransformAction::Translate => TRANSLATE_PROMPT,
        }
    }

    /// Sampling temperature. Corrections and translations stay close
    /// to deterministic while rewrites get a little more freedom.
    pub fn temperature(&self) -> f32 {
        match self {
            TransformAction::FixGrammar => 0.05,
            TransformAction::Translate => 0.1,
            TransformAction::MoreFormal | TransformAction::ToneOfVoice => 0.2,
            TransformAction::Rephrase | TransformAction::MoreFriendly => 0.3,
        }
    }

    /// Message shown to the user when the transformation fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            TransformAction::FixGrammar => "Error fixing grammar and spelling",
            TransformAction::Translate => "Error translating text to Spanish",
            TransformAction::Rephrase => "Error rephrasing text",
            TransformAction::ToneOfVoice => "Error adjusting tone to professional",
            TransformAction::MoreFriendly => "Error making text more friendly",
            TransformAction::MoreFormal => "Error making text more formal",
        }
    }
}

impl fmt::Display for TransformAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransformAction {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransformAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| TransformError::InvalidAction(s.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Invalid action: {0}")]
    InvalidAction(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("Text too long (max {} characters)", MAX_TEXT_LENGTH)]
    TextTooLong,
    #[error("AI returned empty or invalid content for {0}")]
    EmptyModelOutput(TransformAction),
    #[error("model timed out during {0}")]
    ModelTimeout(TransformAction),
    #[error("{action} failed: {source}")]
    Model {
        action: TransformAction,
        source: ModelError,
    },
}

impl TransformError {
    fn from_model(action: TransformAction, err: ModelError) -> Self {
        match err {
            ModelError::Timeout => TransformError::ModelTimeout(action),
            source => TransformError::Model { action, source },
        }
    }

    /// The action being run when the model failed. Input errors are
    /// raised before an action is selected so they have none.
    pub fn action(&self) -> Option<TransformAction> {
        match self {
            TransformError::EmptyModelOutput(action)
            | TransformError::ModelTimeout(action)
            | TransformError::Model { action, .. } => Some(*action),
            _ => None,
        }
    }

    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            TransformError::InvalidAction(_)
                | TransformError::InvalidInput(_)
                | TransformError::TextTooLong
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformOutcome {
    pub action: TransformAction,
    pub transformed_text: String,
    pub original_length: usize,
    pub transformed_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TransformOutcome {
    fn new(action: TransformAction, original: &str, transformed: String, note: Option<String>) -> Self {
        Self {
            action,
            original_length: original.chars().count(),
            transformed_length: transformed.chars().count(),
            transformed_text: transformed,
            note,
        }
    }
}

/// Runs transform actions against the model.
#[derive(Clone)]
pub struct Transformer {
    client: SharedModelClient,
    rephrase_retry: RetryPolicy,
}

impl Transformer {
    pub fn new(client: SharedModelClient) -> Self {
        Self {
            client,
            rephrase_retry: RetryPolicy::rephrase(),
        }
    }

    /// Validate raw request fields and run the transformation.
    pub async fn transform_text(
        &self,
        action: Option<&str>,
        text: Option<&str>,
    ) -> Result<TransformOutcome, TransformError> {
        let (action, text) = match (action, text) {
            (Some(action), Some(text)) if !action.is_empty() => (action, text),
            _ => {
                return Err(TransformError::InvalidInput(
                    "Missing required fields: action and text".to_string(),
                ));
            }
        };
        if text.chars().count() > MAX_TEXT_LENGTH {
            return Err(TransformError::TextTooLong);
        }
        let action = action.parse::<TransformAction>()?;
        self.transform(action, text).await
    }

    pub async fn transform(
        &self,
        action: TransformAction,
        text: &str,
    ) -> Result<TransformOutcome, TransformError> {
        if text.is_empty() {
            return Err(TransformError::InvalidInput(
                "Text must not be empty".to_string(),
            ));
        }
        if text.chars().count() > MAX_TEXT_LENGTH {
            return Err(TransformError::TextTooLong);
        }

        let temperature = action.temperature();
        let request = ModelRequest::new(vec![
            Message::new(Role::System, action.system_prompt()),
            Message::new(Role::User, text),
        ])
        .with_temperature(temperature);

        let raw = self
            .client
            .complete(request)
            .await
            .map_err(|e| TransformError::from_model(action, e))?;
        tracing::debug!("Raw model output for {}: {:?}", action, raw);

        let output = raw.trim();
        if output.is_empty() {
            tracing::error!("AI returned empty or invalid content for {}", action);
            if action == TransformAction::FixGrammar {
                return Ok(TransformOutcome::new(
                    action,
                    text,
                    text.to_string(),
                    Some(EMPTY_OUTPUT_NOTE.to_string()),
                ));
            }
            return Err(TransformError::EmptyModelOutput(action));
        }
        let output = output.to_string();

        let outcome = match action {
            TransformAction::FixGrammar => match check_grammar_fix(text, &output) {
                GrammarVerdict::Accept => TransformOutcome::new(action, text, output, None),
                GrammarVerdict::Fallback(reason) => {
                    tracing::warn!(
                        "Grammar fix returned problematic output ({}): {:?}. Returning original text.",
                        reason,
                        output
                    );
                    TransformOutcome::new(
                        action,
                        text,
                        text.to_string(),
                        Some(format!("Original text kept: {}.", reason)),
                    )
                }
            },
            TransformAction::Translate => {
                if same_text(text, &output) && text.chars().count() > 5 {
                    tracing::warn!("Translation may have failed - text unchanged: {:?}", text);
                }
                TransformOutcome::new(action, text, output, None)
            }
            TransformAction::Rephrase => {
                let output = if text.chars().count() > 10 {
                    self.retry_rephrase(text, output, temperature).await?
                } else {
                    output
                };
                TransformOutcome::new(action, text, output, None)
            }
            TransformAction::ToneOfVoice
            | TransformAction::MoreFriendly
            | TransformAction::MoreFormal => TransformOutcome::new(action, text, output, None),
        };

        Ok(outcome)
    }

    async fn retry_rephrase(
        &self,
        text: &str,
        output: String,
        temperature: f32,
    ) -> Result<String, TransformError> {
        if !(self.rephrase_retry.retry_condition)(text, &output) {
            return Ok(output);
        }
        tracing::warn!("Rephrasing resulted in identical text, attempting a more direct retry");

        let system_message = match prompt::rephrase_retry(text) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to render rephrase retry prompt: {}", e);
                return Ok(output);
            }
        };

        self.rephrase_retry
            .apply(self.client.as_ref(), text, output, temperature, |t| {
                ModelRequest::new(vec![
                    Message::new(Role::System, &system_message),
                    Message::new(Role::User, text),
                ])
                .with_temperature(t)
            })
            .await
            .map_err(|e| TransformError::from_model(TransformAction::Rephrase, e))
    }
}
