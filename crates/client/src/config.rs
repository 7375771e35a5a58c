//! Client configuration (defaults + environment overrides).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use moderation_auth::{FileStorage, SessionStore};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_API_PREFIX: &str = "/api/v1";
pub const DEFAULT_AUTH_PREFIX: &str = "/auth";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid API URL {0:?}: must start with http:// or https://")]
    InvalidUrl(String),
    #[error("invalid HTTP timeout {0:?}: expected a positive number of seconds")]
    InvalidTimeout(String),
}

/// Where the backend lives and where the session is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin, without trailing slash.
    pub api_url: String,
    /// Path prefix of the resource routers.
    pub api_prefix: String,
    /// Path prefix of the authorization router.
    pub auth_prefix: String,
    pub timeout: Duration,
    /// Session file; `None` means the per-user default location.
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            auth_prefix: DEFAULT_AUTH_PREFIX.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_file: None,
        }
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: normalize_url(api_url.into())?,
            ..Self::default()
        })
    }

    /// Read configuration from `MODERATION_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("MODERATION_API_URL") {
            config.api_url = normalize_url(url)?;
        }
        if let Some(prefix) = lookup("MODERATION_API_PREFIX") {
            config.api_prefix = prefix;
        }
        if let Some(prefix) = lookup("MODERATION_AUTH_PREFIX") {
            config.auth_prefix = prefix;
        }
        if let Some(raw) = lookup("MODERATION_HTTP_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| ConfigError::InvalidTimeout(raw.clone()))?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(path) = lookup("MODERATION_SESSION_FILE") {
            config.session_file = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    /// Open the persistent session this configuration points at.
    ///
    /// Falls back to an in-memory session when no data directory can be
    /// resolved.
    pub fn open_session(&self) -> SessionStore {
        let storage = match &self.session_file {
            Some(path) => FileStorage::open(path.clone()),
            None => match FileStorage::open_default() {
                Ok(storage) => storage,
                Err(err) => {
                    tracing::warn!("no session directory available, session will not persist: {err:?}");
                    return SessionStore::in_memory();
                }
            },
        };
        tracing::debug!("session file at {:?}", storage.path());
        SessionStore::new(Arc::new(storage))
    }
}

fn normalize_url(raw: String) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidUrl(raw));
    }
    Ok(trimmed.to_string())
}
