//! Client configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PUBLIC_ROUTES: [&str; 2] = ["/auth/login", "/auth/register"];
const STATE_FILE_RELATIVE: &str = ".peerflow/session.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub auth_base_url: String,
    pub state_file: PathBuf,
    pub public_routes: Vec<String>,
    pub timeouts: HttpTimeouts,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `PEERFLOW_API_BASE_URL`: default `http://localhost:8000`
    /// - `PEERFLOW_AUTH_BASE_URL`: defaults to the API base URL
    /// - `PEERFLOW_STATE_FILE`: default `$HOME/.peerflow/session.json`
    /// - `PEERFLOW_PUBLIC_ROUTES`: comma-separated, default `/auth/login,/auth/register`
    /// - `PEERFLOW_REQUEST_TIMEOUT_SECS`: default 30
    /// - `PEERFLOW_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if a timeout is not a non-negative integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an explicit variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if a timeout is not a non-negative integer.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = normalize_base_url(
            lookup("PEERFLOW_API_BASE_URL")
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE_URL),
        );
        let auth_base_url = lookup("PEERFLOW_AUTH_BASE_URL")
            .map(|raw| normalize_base_url(&raw))
            .unwrap_or_else(|| api_base_url.clone());

        let state_file = match lookup("PEERFLOW_STATE_FILE") {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_state_file(lookup("HOME")),
        };

        let public_routes = lookup("PEERFLOW_PUBLIC_ROUTES")
            .map(|raw| parse_routes(&raw))
            .filter(|routes| !routes.is_empty())
            .unwrap_or_else(|| DEFAULT_PUBLIC_ROUTES.iter().map(|r| (*r).to_owned()).collect());

        let timeouts = HttpTimeouts {
            request_secs: parse_secs(
                "PEERFLOW_REQUEST_TIMEOUT_SECS",
                lookup("PEERFLOW_REQUEST_TIMEOUT_SECS"),
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            connect_secs: parse_secs(
                "PEERFLOW_CONNECT_TIMEOUT_SECS",
                lookup("PEERFLOW_CONNECT_TIMEOUT_SECS"),
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?,
        };

        Ok(Self { api_base_url, auth_base_url, state_file, public_routes, timeouts })
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn default_state_file(home: Option<String>) -> PathBuf {
    match home {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(STATE_FILE_RELATIVE),
        _ => PathBuf::from(STATE_FILE_RELATIVE),
    }
}

fn parse_routes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_secs(var: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
