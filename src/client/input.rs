//! Line input abstraction for the client writer flow.
//!
//! The protocol logic is agnostic to where lines come from; the console
//! implementation runs rustyline on a dedicated blocking thread and feeds an
//! unbounded channel, so tests can drive the writer flow with a scripted or
//! mocked source instead.

use async_trait::async_trait;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

/// Source of user-entered lines.
///
/// `next_line` returns `None` when the input is exhausted (Ctrl+C/Ctrl+D on
/// the console), which is the client's only shutdown signal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LineSource: Send {
    async fn next_line(&mut self) -> Option<String>;
}

/// Interactive console input backed by rustyline.
pub struct ConsoleLineSource {
    rx: mpsc::UnboundedReceiver<String>,
}

impl ConsoleLineSource {
    /// Start the readline thread with the given prompt.
    pub fn spawn(prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::spawn(move || {
            let mut rl = match DefaultEditor::new() {
                Ok(rl) => rl,
                Err(e) => {
                    eprintln!("Failed to initialize readline: {}", e);
                    return;
                }
            };

            loop {
                match rl.readline(&prompt) {
                    Ok(line) => {
                        let line = line.trim();
                        if !line.is_empty() {
                            rl.add_history_entry(line).ok();
                            if tx.send(line.to_string()).is_err() {
                                // Channel closed, exit thread
                                break;
                            }
                        }
                    }
                    Err(ReadlineError::Interrupted) => {
                        // Ctrl+C
                        tracing::info!("Interrupted");
                        break;
                    }
                    Err(ReadlineError::Eof) => {
                        // Ctrl+D
                        tracing::info!("EOF");
                        break;
                    }
                    Err(err) => {
                        tracing::error!("Readline error: {}", err);
                        break;
                    }
                }
            }
        });

        Self { rx }
    }
}

#[async_trait]
impl LineSource for ConsoleLineSource {
    async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}
