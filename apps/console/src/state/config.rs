//! # Configuration State
//!
//! Wraps the client configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`VETDESK_*`)
//! 2. Config file (`config.toml` in the platform config dir)
//! 3. Defaults
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use vetdesk_client::ClientConfig;
use vetdesk_core::Money;

#[derive(Debug, Clone, Default)]
pub struct ConfigState {
    pub client: ClientConfig,
}

impl ConfigState {
    pub fn new(client: ClientConfig) -> Self {
        ConfigState { client }
    }

    /// Formats an amount with the configured currency symbol.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(Money::from_cents(123456)), "$1234.56");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        format!(
            "{}{}{}.{:02}",
            if amount.is_negative() { "-" } else { "" },
            self.client.display.currency_symbol,
            amount.major().abs(),
            amount.cents_part()
        )
    }
}
