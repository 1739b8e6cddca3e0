//! # Terminal Shell
//!
//! The prompt loop plus the terminal-backed notifier and confirmer.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Prompt Loop                                          │
//! │                                                                         │
//! │   stdin (shared) ──► next line ──► Command::parse ──► dispatch         │
//! │        ▲                                                  │             │
//! │        │                                                  ▼             │
//! │   PromptConfirmer ◄──── "Confirm sale ...? [y/N]" ◄── controller        │
//! │                                                                         │
//! │   Notices ──► TerminalNotifier ──► "[ok] Sale recorded"                │
//! │   ConsoleError not yet shown ──► "[CART_ERROR] Cart is empty"          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The confirmer and the loop read the same stdin. The loop only holds the
//! lock while waiting for a line, so a command can ask a question mid-run.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::commands::{self, dispatch, Command, Flow};
use crate::error::ConsoleError;
use crate::state::AppState;
use vetdesk_client::{Confirmer, Notice, NoticeLevel, Notifier, Route};

/// Line reader shared by the loop and the confirmer.
pub type SharedInput = Arc<Mutex<Lines<BufReader<Stdin>>>>;

pub fn stdin_lines() -> SharedInput {
    Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()))
}

fn flush_stdout() {
    if let Err(e) = std::io::stdout().flush() {
        debug!(error = %e, "stdout flush failed");
    }
}

// =============================================================================
// Notifier & Confirmer
// =============================================================================

pub fn format_notice(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Success => "ok",
        NoticeLevel::Info => "info",
        NoticeLevel::Error => "error",
    };
    format!("[{}] {}", tag, notice.message)
}

/// Prints notices as they arrive, including from background tasks.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        println!("{}", format_notice(&notice));
    }
}

/// Yes for `y`, `yes`, `s`, `si`, `sí`. Anything else is no.
pub fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "s" | "si" | "sí"
    )
}

pub struct PromptConfirmer {
    input: SharedInput,
}

impl PromptConfirmer {
    pub fn new(input: SharedInput) -> Self {
        PromptConfirmer { input }
    }
}

#[async_trait]
impl Confirmer for PromptConfirmer {
    async fn confirm(&self, prompt: &str) -> bool {
        print!("{} [y/N] ", prompt);
        flush_stdout();

        match self.input.lock().await.next_line().await {
            Ok(Some(answer)) => is_yes(&answer),
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Could not read the answer");
                false
            }
        }
    }
}

// =============================================================================
// Prompt Loop
// =============================================================================

fn prompt_text(route: Route) -> String {
    format!("vetdesk:{}> ", route.path())
}

fn report(error: &ConsoleError) {
    if error.already_notified() {
        debug!(error = %error, "Command failed");
    } else {
        println!("{}", error);
    }
}

/// Parses and runs one line, reporting any error not shown yet.
pub async fn handle_line(state: &mut AppState, line: &str) -> Flow {
    let command = match Command::parse(line) {
        Ok(Some(command)) => command,
        Ok(None) => return Flow::Continue,
        Err(e) => {
            report(&e);
            return Flow::Continue;
        }
    };

    match dispatch(state, command).await {
        Ok(flow) => flow,
        Err(e) => {
            report(&e);
            Flow::Continue
        }
    }
}

/// Reads commands until `quit` or end of input.
pub async fn run(state: &mut AppState, input: SharedInput) -> anyhow::Result<()> {
    println!("VetDesk console. Type 'help' for commands.");

    loop {
        print!("{}", prompt_text(state.route));
        flush_stdout();

        let line = input
            .lock()
            .await
            .next_line()
            .await
            .context("reading from stdin")?;
        let Some(line) = line else {
            commands::auth::leave(state).await;
            println!();
            break;
        };

        if handle_line(state, &line).await == Flow::Quit {
            break;
        }
    }
    Ok(())
}
