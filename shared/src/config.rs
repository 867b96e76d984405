use crate::{Error, Result};
use tracing::{debug, warn};

/// Connection settings for the remote store backing the cache
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

impl Config {
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 6379;

    const HOST_VAR: &'static str = "EMBER_REDIS_HOST";
    const PORT_VAR: &'static str = "EMBER_REDIS_PORT";
    const PASSWORD_VAR: &'static str = "EMBER_REDIS_PASSWORD";

    pub fn new(host: impl Into<String>, port: u16, password: Option<String>) -> Self {
        Self {
            host: host.into(),
            port,
            password,
        }
    }

    /// Load from the process environment, reading a `.env` file first if one exists
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment variables from {}", path.display()),
            Err(_) => debug!("No .env file found, using system environment variables"),
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve settings through `lookup`, falling back to defaults for missing or invalid values
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup(Self::HOST_VAR).unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let port = match lookup(Self::PORT_VAR) {
            Some(raw) => raw.trim().parse::<u16>().unwrap_or_else(|_| {
                warn!(
                    "{} is not a valid port ('{}'), using {}",
                    Self::PORT_VAR,
                    raw,
                    Self::DEFAULT_PORT
                );
                Self::DEFAULT_PORT
            }),
            None => Self::DEFAULT_PORT,
        };

        Self {
            host,
            port,
            password: Self::password_from(&lookup),
        }
    }

    /// Like [`Config::from_lookup`] but rejects an invalid port instead of defaulting
    pub fn try_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup(Self::HOST_VAR).unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let port = match lookup(Self::PORT_VAR) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                Error::Config(format!("{} must be a port number, got '{}': {}", Self::PORT_VAR, raw, e))
            })?,
            None => Self::DEFAULT_PORT,
        };

        Ok(Self {
            host,
            port,
            password: Self::password_from(&lookup),
        })
    }

    // An empty password means the store does not require one
    fn password_from(lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
        lookup(Self::PASSWORD_VAR).filter(|p| !p.is_empty())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HOST, Self::DEFAULT_PORT, None)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
