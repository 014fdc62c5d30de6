use std::sync::Arc;

use anyhow::Result;

use crate::ai::{SharedModelClient, TransformAction, Transformer};
use crate::core::AppConfig;
use crate::openai::OpenAiClient;

pub async fn run(action: TransformAction, text: &str) -> Result<()> {
    let config = AppConfig::default();
    let client = OpenAiClient::from_config(&config)?;
    let transformer = Transformer::new(Arc::new(client) as SharedModelClient);

    let outcome = transformer.transform(action, text).await?;
    println!("{}", outcome.transformed_text);
    if let Some(note) = outcome.note {
        eprintln!("Note: {}", note);
    }

    Ok(())
}
