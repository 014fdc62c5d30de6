use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod chat;
pub mod serve;
pub mod transform;

use crate::ai::TransformAction;

#[derive(Subcommand)]
enum Command {
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port (defaults to the PORT env var or 3001)
        #[arg(long)]
        port: Option<String>,
    },
    /// Transform a piece of text and print the result
    Transform {
        #[arg(long)]
        action: TransformAction,
        #[arg(long)]
        text: String,
    },
    /// Start an interactive copilot chat session
    Chat {
        /// Summary of the support conversation the copilot should consider
        #[arg(long)]
        context: Option<String>,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await?;
        }
        Some(Command::Transform { action, text }) => {
            transform::run(action, &text).await?;
        }
        Some(Command::Chat { context }) => {
            chat::run(context).await?;
        }
        None => {}
    }

    Ok(())
}
