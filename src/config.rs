//! Configuration Module
//!
//! Handles loading core settings from environment variables.

use std::env;
use std::str::FromStr;

use crate::helpers::HelperMode;
use crate::limiter::WindowPolicy;

/// Core configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether boot creates the process cache eagerly
    pub preload: bool,
    /// Delay in milliseconds before the preloaded cache becomes available
    pub preload_delay_ms: u64,
    /// Fixed window length in milliseconds
    pub rate_window_ms: u64,
    /// Calls allowed per window on the login lane
    pub login_rate_limit: u64,
    /// What the limiter does to the window start on reset
    pub window_policy: WindowPolicy,
    /// Literal or corrected numeric helpers
    pub helper_mode: HelperMode,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PRELOAD` - Create the cache on boot (default: true)
    /// - `PRELOAD_DELAY_MS` - Preload delay (default: 50)
    /// - `RATE_WINDOW_MS` - Limiter window (default: 1000)
    /// - `LOGIN_RATE_LIMIT` - Login calls per window (default: 5)
    /// - `WINDOW_POLICY` - `sticky` or `rolling` (default: sticky)
    /// - `HELPER_MODE` - `literal` or `corrected` (default: literal)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            preload: env_or("PRELOAD", defaults.preload),
            preload_delay_ms: env_or("PRELOAD_DELAY_MS", defaults.preload_delay_ms),
            rate_window_ms: env_or("RATE_WINDOW_MS", defaults.rate_window_ms),
            login_rate_limit: env_or("LOGIN_RATE_LIMIT", defaults.login_rate_limit),
            window_policy: env_or("WINDOW_POLICY", defaults.window_policy),
            helper_mode: env_or("HELPER_MODE", defaults.helper_mode),
        }
    }
}

fn env_or<T: FromStr>(name: &str, fallback: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preload: true,
            preload_delay_ms: 50,
            rate_window_ms: 1000,
            login_rate_limit: 5,
            window_policy: WindowPolicy::Sticky,
            helper_mode: HelperMode::Literal,
        }
    }
}
