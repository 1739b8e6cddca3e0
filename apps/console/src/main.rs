//! # VetDesk Console Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        VetDesk Console                                  │
//! │                                                                         │
//! │  main.rs ────► tokio runtime                                           │
//! │                                                                         │
//! │  lib.rs ─────► logging, config, session, prompt loop                   │
//! │                                                                         │
//! │  commands/ ──► go, search, add, checkout, settle, resolve, report      │
//! │                                                                         │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │                     REST backend (Bearer token)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The actual setup is in lib.rs for better testability
    vetdesk_console::run().await
}
