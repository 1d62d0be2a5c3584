use anyhow::Context;
use payloads::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;

use crate::state::SessionConfig;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_STORAGE_PATH: &str = ".ayniline-admin.json";
pub const DEFAULT_LOG_FILTER: &str = "warn,admin=info";

/// Settings for the admin client.
///
/// Every value can come from the environment (or a `.env` file):
/// - AYNILINE_API_URL: backend base URL (default http://localhost:3000)
/// - AYNILINE_TIMEOUT_SECS: per-request timeout (default 10)
/// - AYNILINE_MAX_ATTEMPTS: attempts per request, including the first
///   (default 3)
/// - AYNILINE_STORAGE_PATH: file holding the bearer token between runs
///   (default .ayniline-admin.json)
/// - AYNILINE_VERIFY_INTERVAL_SECS: session re-verification period
///   (default 300)
/// - AYNILINE_LOG: tracing filter, overridden by RUST_LOG
///   (default warn,admin=info)
#[derive(Debug, Clone, PartialEq)]
pub struct AdminConfig {
    pub api_url: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub storage_path: PathBuf,
    pub verify_interval: Duration,
    pub log_filter: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: payloads::api_client::DEFAULT_TIMEOUT,
            max_attempts: 3,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            verify_interval: Duration::from_secs(300),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

fn seconds(name: &str, default: Duration) -> anyhow::Result<Duration> {
    match std::env::var(name) {
        Ok(value) => {
            let secs: u64 = value.trim().parse().with_context(|| {
                format!("{name} must be a whole number of seconds")
            })?;
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(default),
    }
}

impl AdminConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        use std::env::var;

        let defaults = Self::default();
        let max_attempts = match var("AYNILINE_MAX_ATTEMPTS") {
            Ok(value) => value
                .trim()
                .parse()
                .context("AYNILINE_MAX_ATTEMPTS must be a positive number")?,
            Err(_) => defaults.max_attempts,
        };
        Ok(Self {
            api_url: var("AYNILINE_API_URL").unwrap_or(defaults.api_url),
            timeout: seconds("AYNILINE_TIMEOUT_SECS", defaults.timeout)?,
            max_attempts,
            storage_path: var("AYNILINE_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
            verify_interval: seconds(
                "AYNILINE_VERIFY_INTERVAL_SECS",
                defaults.verify_interval,
            )?,
            log_filter: var("AYNILINE_LOG").unwrap_or(defaults.log_filter),
        })
    }

    /// Exponential backoff from one second, `max_attempts` tries in total.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(self.max_attempts, Duration::from_secs(1))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            verify_interval: self.verify_interval,
            ..SessionConfig::default()
        }
    }
}
