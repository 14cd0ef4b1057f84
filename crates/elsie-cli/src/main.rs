//! Interactive REPL front-end wiring the Router API to a terminal session.
//! Stands in for the chat front-end described as out-of-scope collaborator:
//! it only exchanges channel metadata and strings with the router.

use std::io::{self, BufRead, Write};

use elsie_conversation::{ContextBuilder, ResponseDirective, Router};
use elsie_core::ChannelContext;
use elsie_ingest::Ingestor;
use elsie_wiki::ArchiveClient;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "elsie_cli=info".into()),
        )
        .init();

    let config_path = std::env::var("ELSIE_CONFIG").ok();
    let config = elsie_core::ElsieConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        elsie_core::ElsieConfig::default()
    });

    let store = match Ingestor::connect_store(&config.database.connection_string()).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "could not reach the store");
            std::process::exit(1);
        }
    };

    let archive = ArchiveClient::new(config.archive.api_url.clone());
    let context_builder = ContextBuilder::new(
        store,
        archive,
        config.archive.enabled,
        config.conversation.prompt_char_budget,
    );
    let router = Router::new(context_builder);

    info!("Elsie is listening. Type a line and press enter; Ctrl-D to quit.");

    let channel = ChannelContext::dm("cli-session");
    let mut history: Vec<(String, String)> = Vec::new();

    let stdin = io::stdin();
    print!("> ");
    io::stdout().flush().ok();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            print!("> ");
            io::stdout().flush().ok();
            continue;
        }

        let directive = router.route(&line, &history, channel.clone()).await;
        history.push(("user".to_string(), line.clone()));

        match directive {
            ResponseDirective::LiteralReply(text) => {
                println!("{text}");
                history.push(("elsie".to_string(), text));
            }
            ResponseDirective::InvokeLlm { prompt, is_ooc } => {
                println!("[invoke_llm, ooc={is_ooc}]\n{prompt}");
            }
            ResponseDirective::NoResponse => {
                println!("(no response)");
            }
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    Ok(())
}
