//! Retry wrapper for model calls whose first answer wasn't usable.

use crate::ai::heuristics::same_text;
use crate::ai::model::{ModelClient, ModelError, ModelRequest};

/// When and how to ask the model again. Each retry raises the
/// sampling temperature by `temperature_delta`, capped at
/// `max_temperature`.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub retry_condition: fn(input: &str, output: &str) -> bool,
    pub temperature_delta: f32,
    pub max_temperature: f32,
}

/// The model handed the input back without changing it.
pub fn output_equals_input(input: &str, output: &str) -> bool {
    same_text(input, output)
}

impl RetryPolicy {
    /// Policy for rephrasing: one more attempt when the model returned
    /// the input unchanged.
    pub fn rephrase() -> Self {
        Self {
            max_retries: 1,
            retry_condition: output_equals_input,
            temperature_delta: 0.15,
            max_temperature: 0.7,
        }
    }

    pub fn next_temperature(&self, temperature: f32) -> f32 {
        (temperature + self.temperature_delta).min(self.max_temperature)
    }

    /// Re-invoke the model while `retry_condition` holds for the
    /// current output. `build_request` receives the raised temperature
    /// for each attempt. The first output is kept unless a retry
    /// produces non-empty text that no longer meets the condition. A
    /// failed retry call fails the whole attempt.
    pub async fn apply<F>(
        &self,
        client: &dyn ModelClient,
        input: &str,
        first_output: String,
        temperature: f32,
        build_request: F,
    ) -> Result<String, ModelError>
    where
        F: Fn(f32) -> ModelRequest,
    {
        let mut temperature = temperature;

        for attempt in 1..=self.max_retries {
            if !(self.retry_condition)(input, &first_output) {
                break;
            }
            temperature = self.next_temperature(temperature);
            tracing::debug!("Retry attempt {} at temperature {}", attempt, temperature);

            let candidate = client
                .complete(build_request(temperature))
                .await
                .inspect_err(|e| tracing::error!("Retry attempt {} failed: {}", attempt, e))?;
            let candidate = candidate.trim();
            if !candidate.is_empty() && !(self.retry_condition)(input, candidate) {
                tracing::info!("Retry attempt {} succeeded", attempt);
                return Ok(candidate.to_string());
            }
            tracing::warn!(
                "Retry attempt {} also resulted in identical or empty text",
                attempt
            );
        }

        Ok(first_output)
    }
}
