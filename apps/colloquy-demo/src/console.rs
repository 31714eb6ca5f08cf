//! Console channel: stdin lines into the conversation mailbox, resolved bot
//! utterances onto stdout.

use std::io::Write;
use std::sync::Arc;

use colloquy_core::{BotUtterance, Event, EventSource, Mailbox, OutputSink, Utterance};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

/// Prints every resolved bot utterance on its own line.
pub struct ConsoleOutput;

impl OutputSink for ConsoleOutput {
    fn utterance(&self, utterance: &BotUtterance) {
        println!("{}", utterance.text);
    }
}

/// Pump stdin lines into the mailbox until EOF or an exit command.
///
/// Blank lines are skipped; exit commands close the mailbox so the pending
/// ask sees the source end instead of waiting forever.
pub fn spawn_stdin_pump(
    mailbox: Arc<Mailbox>,
    prompt: String,
    exit_commands: Vec<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("{prompt}");
            let _ = std::io::stdout().flush();
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let text = line.trim().to_string();
                    if text.is_empty() {
                        continue;
                    }
                    if exit_commands.iter().any(|cmd| cmd.eq_ignore_ascii_case(&text)) {
                        mailbox.close();
                        break;
                    }
                    mailbox.send(Event::user_utterance(Utterance::from_text(text)));
                }
                Ok(None) | Err(_) => {
                    mailbox.close();
                    break;
                }
            }
        }
    })
}
