//! Configuration with TOML, environment variable, and CLI overrides.

use crate::scrape::retry::RetryPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Retry attempts per navigation-dependent operation
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Fixed delay between retry attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Wait bound for listing containers and pagination affordances
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,

    /// Wait bound for the results table to render
    #[serde(default = "default_table_timeout_ms")]
    pub table_timeout_ms: u64,

    /// Politeness pause after each completed city subtree
    #[serde(default = "default_city_delay_ms")]
    pub city_delay_ms: u64,

    /// Run the browser without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Directory the output document is written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    5000
}

fn default_wait_timeout_ms() -> u64 {
    5000
}

fn default_table_timeout_ms() -> u64 {
    10_000
}

fn default_city_delay_ms() -> u64 {
    1000
}

fn default_headless() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            wait_timeout_ms: default_wait_timeout_ms(),
            table_timeout_ms: default_table_timeout_ms(),
            city_delay_ms: default_city_delay_ms(),
            headless: default_headless(),
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("tally-crawler").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(attempts) = std::env::var("TALLY_ATTEMPTS") {
            if let Ok(a) = attempts.parse() {
                self.attempts = a;
            }
        }

        if let Ok(delay) = std::env::var("TALLY_RETRY_DELAY_MS") {
            if let Ok(d) = delay.parse() {
                self.retry_delay_ms = d;
            }
        }

        if let Ok(delay) = std::env::var("TALLY_CITY_DELAY_MS") {
            if let Ok(d) = delay.parse() {
                self.city_delay_ms = d;
            }
        }

        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn table_timeout(&self) -> Duration {
        Duration::from_millis(self.table_timeout_ms)
    }

    pub fn city_delay(&self) -> Duration {
        Duration::from_millis(self.city_delay_ms)
    }
}

/// Parses the `--headless` CLI string: `true`, `1` and `yes` (any case)
/// enable headless mode, everything else disables it.
pub fn parse_headless(raw: &str) -> bool {
    matches!(raw.to_lowercase().as_str(), "true" | "1" | "yes")
}
