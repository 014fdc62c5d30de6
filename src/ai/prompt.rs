//! Reusable prompts using Handlebars for templating. Handlebars adds
//! additional security controls since it can't do much out of the box
//! without registering your own helpers. This is ideal since text
//! pasted in by users should be considered untrusted and Handlebars
//! forces you to add only what you need.

use std::fmt;
use std::sync::LazyLock;

use handlebars::{Handlebars, RenderError};
use serde_json::json;

#[derive(Debug)]
pub enum Prompt {
    RephraseRetry,
    ChatContext,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<Prompt> for String {
    fn from(item: Prompt) -> String {
        format!("{:?}", item)
    }
}

const REPHRASE_RETRY_PROMPT: &str = r#"The user wants this text rephrased using different words: "{{text}}". You MUST use different vocabulary while keeping the exact same meaning and tone. It is essential that your output is different from the original text. Output only the rephrased text, with no explanations or preamble. The user will now provide the text."#;

const CHAT_CONTEXT_PROMPT: &str = r"
Summary of the customer conversation the agent is currently viewing:

{{context}}
";

pub fn templates<'a>() -> Handlebars<'a> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    // Prompts are plain text, not HTML
    registry.register_escape_fn(handlebars::no_escape);
    registry
        .register_template_string(&Prompt::RephraseRetry.to_string(), REPHRASE_RETRY_PROMPT)
        .expect("Failed to register template");
    registry
        .register_template_string(&Prompt::ChatContext.to_string(), CHAT_CONTEXT_PROMPT)
        .expect("Failed to register template");
    registry
}

static TEMPLATES: LazyLock<Handlebars<'static>> = LazyLock::new(|| templates());

pub fn rephrase_retry(text: &str) -> Result<String, RenderError> {
    TEMPLATES.render(&Prompt::RephraseRetry.to_string(), &json!({ "text": text }))
}

pub fn chat_context(context: &str) -> Result<String, RenderError> {
    TEMPLATES
        .render(&Prompt::ChatContext.to_string(), &json!({ "context": context }))
        .map(|s| s.trim().to_string())
}
