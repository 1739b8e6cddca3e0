//! # VetDesk Console Library
//!
//! Operator console for the VetDesk veterinary supply backend.
//! This is the entry point that wires configuration, session, backend and
//! the prompt loop together.
//!
//! ## Module Organization
//! ```text
//! vetdesk_console/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── shell.rs        ◄─── Prompt loop, terminal notifier & confirmer
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState, per-screen controllers
//! │   ├── cart.rs     ◄─── Sale draft behind a mutex
//! │   └── config.rs   ◄─── Configuration & currency display
//! ├── commands/
//! │   ├── mod.rs      ◄─── Parsing, route guard, dispatch
//! │   └── ...         ◄─── One file per screen
//! └── error.rs        ◄─── Console error type
//! ```
//!
//! ## State Management
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Console State                                        │
//! │                                                                         │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────────┐   │
//! │  │  SessionStore    │ │    CartState     │ │    ConfigState       │   │
//! │  │                  │ │                  │ │                      │   │
//! │  │  • Bearer token  │ │  • Cart lines    │ │  • API url           │   │
//! │  │  • Admin flag    │ │  • Customer      │ │  • Currency symbol   │   │
//! │  │  • Session file  │ │  • On credit     │ │  • Alert period      │   │
//! │  └──────────────────┘ └──────────────────┘ └──────────────────────┘   │
//! │                                                                         │
//! │  Views: LiveSearch, Checkout, AccountView, AlertBoard, ReportsLoader,  │
//! │         Product/Service/CustomerAdmin, SalesHistory                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod shell;
pub mod state;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shell::{PromptConfirmer, TerminalNotifier};
use state::{AppState, Apis, ConfigState};
use vetdesk_client::{ClientConfig, Confirmer, HttpBackend, Notifier, SessionStore};

/// Runs the console until `quit` or end of input.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Console Startup                                   │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter, written to stderr             │
/// │     • Default: WARN, INFO for vetdesk crates, RUST_LOG overrides        │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • config.toml, then VETDESK_* environment variables                 │
/// │                                                                         │
/// │  3. Restore Session ──────────────────────────────────────────────────► │
/// │     • session.toml in the platform data dir (token, remembered user)    │
/// │                                                                         │
/// │  4. Build Backend & State ────────────────────────────────────────────► │
/// │     • HttpBackend (reqwest) shared by every controller                  │
/// │                                                                         │
/// │  5. Prompt Loop ──────────────────────────────────────────────────────► │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting VetDesk console");

    let client = ClientConfig::load_or_default(None);
    info!(base_url = %client.base_url(), "Configuration loaded");

    let session = Arc::new(SessionStore::open(client.session_path()));
    let backend = HttpBackend::new(&client, session.clone()).context("building the HTTP client")?;

    let input = shell::stdin_lines();
    let notifier: Arc<dyn Notifier> = Arc::new(TerminalNotifier);
    let confirmer: Arc<dyn Confirmer> = Arc::new(PromptConfirmer::new(input.clone()));

    let mut state = AppState::new(
        ConfigState::new(client),
        session,
        Apis::from_backend(Arc::new(backend)),
        notifier,
        confirmer,
    );

    if let Some(user) = state.session.remembered_user().await {
        if !state.session.is_authenticated().await {
            println!("Last user: {}", user);
        }
    }

    shell::run(&mut state, input).await?;

    info!("Console closed");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=vetdesk_client=trace` - Trace the client crate only
/// - Default: WARN, INFO for vetdesk crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,vetdesk_console=info,vetdesk_client=info,reqwest=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
