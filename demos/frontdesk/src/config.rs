//! Demo configuration loaded from environment variables.

use std::env;

/// Front desk demo configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the persisted cart
    pub cart_dir: String,
    /// Base URL of the resort API; the live event feed is enabled when set
    pub api_base: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            cart_dir: env::var("STILLWATER_CART_DIR")
                .unwrap_or_else(|_| "frontdesk-data".to_string()),
            api_base: env::var("STILLWATER_API_BASE").ok(),
        }
    }
}
