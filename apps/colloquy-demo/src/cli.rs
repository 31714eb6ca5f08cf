use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use colloquy_config::{load_config, ColloquyConfig};
use colloquy_core::{AskPolicy, Conversation, Mailbox, Policy};

#[derive(Debug, Parser)]
#[command(name = "colloquy-demo", about = "Console demo bot for the colloquy engine")]
pub struct Cli {
    /// Path to a YAML config; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = match &self.config {
            Some(path) => load_config(path)?,
            None => ColloquyConfig::default(),
        };
        init_tracing(&config, self.verbose);

        let mailbox = Arc::new(Mailbox::new());
        let conversation = Conversation::builder()
            .language(config.localization.default_language.clone())
            .source(mailbox.clone())
            .output(Arc::new(crate::console::ConsoleOutput))
            .messages(Arc::new(crate::bot::messages()))
            .types(Arc::new(crate::bot::types()))
            .intents(Arc::new(crate::bot::intents()))
            .policy(Policy {
                ask: AskPolicy {
                    max_attempts: config.ask.max_attempts,
                    exception_on_max_attempts: config.ask.exception_on_max_attempts,
                },
            })
            .build();
        tracing::info!(conversation = %conversation.id, app = %config.app.name, "session start");

        let pump = crate::console::spawn_stdin_pump(
            mailbox,
            config.session.prompt.clone(),
            config.session.exit_commands.clone(),
        );

        let outcome = crate::bot::agent()
            .to_action()
            .run(conversation.context())
            .await;
        tracing::info!(success = outcome.is_success(), "session end");

        pump.abort();
        Ok(())
    }
}

fn init_tracing(config: &ColloquyConfig, verbose: bool) {
    let fallback = if verbose {
        "debug"
    } else {
        match config.observability.log_level.trim().to_ascii_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "warn" => "warn",
            "error" => "error",
            _ => "info",
        }
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
