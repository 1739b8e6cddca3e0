//! # Client Configuration
//!
//! Configuration for the backend connection, live search, alert polling and
//! display.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     VETDESK_API_URL=http://192.168.1.20:4000                           │
//! │     VETDESK_AUTO_REFRESH=false                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/vetdesk/config.toml (Linux)                              │
//! │     ~/Library/Application Support/com.vetdesk.console/config.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:4000, 300 ms debounce, 60 s alert refresh         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # config.toml
//! [api]
//! base_url = "http://localhost:4000"
//! connect_timeout_secs = 10
//! report_timeout_secs = 20
//!
//! [search]
//! debounce_ms = 300
//! result_limit = 40
//!
//! [alerts]
//! auto_refresh = true
//! refresh_interval_secs = 60
//!
//! [display]
//! currency_symbol = "$"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};
use vetdesk_core::{
    ALERT_REFRESH_SECS, BROWSE_PAGE_SIZE, REPORT_TIMEOUT_SECS, SEARCH_DEBOUNCE_MS,
    SEARCH_RESULT_LIMIT, TOP_ITEMS_LIMIT,
};

// =============================================================================
// API Settings
// =============================================================================

/// Where the REST backend lives and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Backend origin. Endpoint paths (`/api/...`) are joined onto it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// TCP connect timeout (seconds). Requests other than reports have no
    /// overall deadline.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Overall deadline for report requests (seconds).
    #[serde(default = "default_report_timeout")]
    pub report_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_report_timeout() -> u64 {
    REPORT_TIMEOUT_SECS
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout(),
            report_timeout_secs: default_report_timeout(),
        }
    }
}

// =============================================================================
// Session Settings
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Session file location. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Search Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Quiet period after the last keystroke (milliseconds).
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,

    /// Results requested per scope.
    #[serde(default = "default_result_limit")]
    pub result_limit: u32,

    /// Page size of the catalog browser.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Entries in each top-sold list.
    #[serde(default = "default_top_items")]
    pub top_items_limit: u32,
}

fn default_debounce() -> u64 {
    SEARCH_DEBOUNCE_MS
}
fn default_result_limit() -> u32 {
    SEARCH_RESULT_LIMIT
}
fn default_page_size() -> u32 {
    BROWSE_PAGE_SIZE
}
fn default_top_items() -> u32 {
    TOP_ITEMS_LIMIT
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            debounce_ms: default_debounce(),
            result_limit: default_result_limit(),
            page_size: default_page_size(),
            top_items_limit: default_top_items(),
        }
    }
}

impl SearchSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// =============================================================================
// Alert Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSettings {
    /// Re-fetch the alert list periodically while the board is open.
    #[serde(default = "default_true")]
    pub auto_refresh: bool,

    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_refresh_interval() -> u64 {
    ALERT_REFRESH_SECS
}

impl Default for AlertSettings {
    fn default() -> Self {
        AlertSettings {
            auto_refresh: true,
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

// =============================================================================
// Display Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            currency_symbol: default_currency_symbol(),
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub alerts: AlertSettings,

    #[serde(default)]
    pub display: DisplaySettings,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (config.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = Url::parse(&self.api.base_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.report_timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "report_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.search.result_limit == 0 || self.search.page_size == 0 {
            return Err(ClientError::InvalidConfig(
                "search limits must be greater than 0".into(),
            ));
        }

        if self.alerts.auto_refresh && self.alerts.refresh_interval_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "refresh_interval_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `VETDESK_*` overrides from a key lookup.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("VETDESK_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(path) = lookup("VETDESK_SESSION_PATH") {
            debug!(path = %path, "Overriding session path from environment");
            self.session.path = Some(PathBuf::from(path));
        }

        if let Some(flag) = lookup("VETDESK_AUTO_REFRESH") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.alerts.auto_refresh = true,
                "0" | "false" | "no" | "off" => self.alerts.auto_refresh = false,
                _ => warn!(value = %flag, "Unknown VETDESK_AUTO_REFRESH value"),
            }
        }

        if let Some(secs) = lookup("VETDESK_ALERT_INTERVAL_SECS") {
            if let Ok(s) = secs.parse::<u64>() {
                self.alerts.refresh_interval_secs = s;
            }
        }

        if let Some(secs) = lookup("VETDESK_REPORT_TIMEOUT_SECS") {
            if let Ok(s) = secs.parse::<u64>() {
                debug!(secs = s, "Overriding report timeout from environment");
                self.api.report_timeout_secs = s;
            }
        }

        if let Some(symbol) = lookup("VETDESK_CURRENCY_SYMBOL") {
            self.display.currency_symbol = symbol;
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "vetdesk", "console")
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Session file location: configured path, else the platform data dir.
    pub fn session_path(&self) -> Option<PathBuf> {
        self.session.path.clone().or_else(|| {
            Self::project_dirs().map(|dirs| dirs.data_dir().join("session.toml"))
        })
    }

    pub fn base_url(&self) -> &str {
        &self.api.base_url
    }

    pub fn report_timeout(&self) -> Duration {
        Duration::from_secs(self.api.report_timeout_secs)
    }

    pub fn alert_refresh_interval(&self) -> Option<Duration> {
        self.alerts
            .auto_refresh
            .then(|| Duration::from_secs(self.alerts.refresh_interval_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:4000");
        assert_eq!(config.api.report_timeout_secs, 20);
        assert_eq!(config.search.debounce_ms, 300);
        assert_eq!(config.search.result_limit, 40);
        assert_eq!(config.alert_refresh_interval(), Some(Duration::from_secs(60)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();

        config.api.base_url = "ftp://example.com".to_string();
        assert!(matches!(config.validate(), Err(ClientError::InvalidUrl(_))));

        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "https://vet.example.com".to_string();
        assert!(config.validate().is_ok());

        config.api.report_timeout_secs = 0;
        assert!(config.validate().unwrap_err().is_config_error());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("VETDESK_API_URL", "http://10.0.0.5:4000"),
            ("VETDESK_AUTO_REFRESH", "off"),
            ("VETDESK_CURRENCY_SYMBOL", "S/"),
            ("VETDESK_REPORT_TIMEOUT_SECS", "abc"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "http://10.0.0.5:4000");
        assert!(!config.alerts.auto_refresh);
        assert_eq!(config.alert_refresh_interval(), None);
        assert_eq!(config.display.currency_symbol, "S/");
        assert_eq!(config.api.report_timeout_secs, 20);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            base_url = "http://vet.local:8080"

            [alerts]
            auto_refresh = false
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://vet.local:8080");
        assert_eq!(config.api.report_timeout_secs, 20);
        assert_eq!(config.search.page_size, 24);
        assert!(!config.alerts.auto_refresh);
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&ClientConfig::default()).unwrap();
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[search]"));
    }
}
