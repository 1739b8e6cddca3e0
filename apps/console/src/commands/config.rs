//! # Config Commands
//!
//! Shows the effective configuration, and writes it to the config file.

use tracing::debug;

use crate::error::{CommandResult, ConsoleError};
use crate::state::AppState;

/// Prints the configuration. With `save`, also writes it to `config.toml`
/// so environment overrides become permanent.
pub fn show(state: &AppState, save: bool) -> CommandResult<()> {
    debug!(save, "config command");

    let client = &state.config.client;
    let json = serde_json::to_string_pretty(client)
        .map_err(|e| ConsoleError::internal(e.to_string()))?;
    println!("{}", json);

    if save {
        client.save(None)?;
        state.notifier.success("Configuration saved");
    }
    Ok(())
}
