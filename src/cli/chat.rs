use std::sync::Arc;

use anyhow::Result;
use futures::StreamExt;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;
use tokio_util::sync::CancellationToken;

use crate::ai::SharedModelClient;
use crate::chat::{ChatRelay, ChatTurn, SessionStore, StreamEvent};
use crate::core::AppConfig;
use crate::openai::OpenAiClient;

pub async fn run(context: Option<String>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    let config = AppConfig::default();
    let client = OpenAiClient::from_config(&config)?;
    let sessions = Arc::new(SessionStore::new(config.session_ttl));
    let relay = ChatRelay::new(
        sessions,
        Arc::new(client) as SharedModelClient,
        &config.system_message,
    );
    let session_id = uuid::Uuid::new_v4().to_string();

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                let turn = ChatTurn {
                    session_id: session_id.clone(),
                    message: line,
                    context: context.clone(),
                };
                let mut events = relay.stream_chat(turn, CancellationToken::new())?;
                while let Some(event) = events.next().await {
                    match event {
                        StreamEvent::Chunk { chunk } => {
                            print!("{}", chunk);
                            std::io::stdout().flush()?;
                        }
                        StreamEvent::End { .. } => println!(),
                        StreamEvent::Error { message, .. } => println!("\n⚠️ {}", message),
                    }
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
