use reqwest::Url;
use std::{env, time::Duration};
use thiserror::Error;

const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the statistics backend.
    pub api_base_url: Url,
    pub port: u16,
    pub request_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid DASHBOARD_API_URL {value:?}: {reason}")]
    InvalidApiUrl { value: String, reason: String },
}

pub fn resolve_config() -> Result<Config, ConfigError> {
    let api_url = env::var("DASHBOARD_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let port = env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    let timeout_secs = env::var("DASHBOARD_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    Ok(Config {
        api_base_url: parse_api_url(&api_url)?,
        port,
        request_timeout: Duration::from_secs(timeout_secs),
    })
}

pub fn parse_api_url(value: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidApiUrl {
        value: value.to_string(),
        reason,
    };
    let url = Url::parse(value.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    Ok(url)
}
