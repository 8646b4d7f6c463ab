use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::sync::retry::DEFAULT_RATE_LIMIT_WAIT;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    Missing(&'static str),
    #[error("MISSKEY_URL is not a valid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Connection settings for one run.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub base_url: Url,
    pub token: String,
    pub request_timeout: Duration,
    pub rate_limit_wait: Duration,
}

impl SyncConfig {
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self {
            base_url,
            token: token.into(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            rate_limit_wait: DEFAULT_RATE_LIMIT_WAIT,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads `MISSKEY_URL`, `MISSKEY_TOKEN`, `MISSKEY_TIMEOUT_SECS` and
    /// `MISSKEY_RATE_LIMIT_WAIT_SECS` through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = read_required(&lookup, "MISSKEY_URL")?;
        let token = read_required(&lookup, "MISSKEY_TOKEN")?;
        let request_timeout = Duration::from_secs(read_u64(
            &lookup,
            "MISSKEY_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        ));
        let rate_limit_wait = Duration::from_secs(read_u64(
            &lookup,
            "MISSKEY_RATE_LIMIT_WAIT_SECS",
            DEFAULT_RATE_LIMIT_WAIT.as_secs(),
        ));

        Ok(Self {
            base_url: Url::parse(&base_url)?,
            token,
            request_timeout,
            rate_limit_wait,
        })
    }
}

fn read_required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn read_u64<F>(lookup: &F, name: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}
