//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use ds_game::db::DatabaseConfig;
use std::net::SocketAddr;
use std::time::Duration;

/// Port used when neither `SERVER_BIND` nor `APP_PORT` is set
pub const DEFAULT_APP_PORT: u16 = 8081;

/// Per-request timeout used when `REQUEST_TIMEOUT_SECS` is not set
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 3;

/// Where matches are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Storage backend
    pub storage: StorageBackend,
    /// Deadline for every API request
    pub request_timeout: Duration,
    /// Games listed when the client doesn't pass `limit`
    pub games_list_limit: u32,
    /// Prometheus exporter address; no exporter when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Command line overrides, applied on top of the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub database_url: Option<String>,
    pub in_memory: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but can't be parsed
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), overrides)
    }

    /// Same as [`ServerConfig::from_env`], reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F, overrides: Overrides) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Bind address
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => match lookup("SERVER_BIND") {
                Some(raw) => parse_var("SERVER_BIND", &raw)?,
                None => {
                    let port = parse_var_or(&lookup, "APP_PORT", DEFAULT_APP_PORT)?;
                    SocketAddr::from(([0, 0, 0, 0], port))
                }
            },
        };

        // Database configuration
        let mut database = DatabaseConfig::from_lookup(&lookup);
        if let Some(url) = overrides.database_url {
            database.database_url = url;
        }

        // Storage backend
        let storage = if overrides.in_memory {
            StorageBackend::Memory
        } else {
            match lookup("STORAGE").map(|s| s.trim().to_lowercase()).as_deref() {
                None | Some("") | Some("postgres") => StorageBackend::Postgres,
                Some("memory") => StorageBackend::Memory,
                Some(other) => {
                    return Err(ConfigError::Invalid {
                        var: "STORAGE".to_string(),
                        reason: format!("Expected \"memory\" or \"postgres\", got {other:?}"),
                    });
                }
            }
        };

        let request_timeout = Duration::from_secs(parse_var_or(
            &lookup,
            "REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);
        let games_list_limit =
            parse_var_or(&lookup, "GAMES_LIST_LIMIT", ds_game::DEFAULT_LIST_LIMIT)?;
        let metrics_bind = lookup("METRICS_BIND")
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_var("METRICS_BIND", &raw))
            .transpose()?;

        Ok(ServerConfig {
            bind,
            database,
            storage,
            request_timeout,
            games_list_limit,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "REQUEST_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.games_list_limit == 0 {
            return Err(ConfigError::Invalid {
                var: "GAMES_LIST_LIMIT".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        // Pool settings only matter when Postgres is in use
        if self.storage == StorageBackend::Postgres {
            if self.database.database_url.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    var: "DATABASE_URL".to_string(),
                    reason: "Must not be empty".to_string(),
                });
            }

            if self.database.min_connections > self.database.max_connections {
                return Err(ConfigError::Invalid {
                    var: "DB_MIN_CONNECTIONS".to_string(),
                    reason: format!(
                        "Cannot exceed max connections ({})",
                        self.database.max_connections
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn parse_var<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var: var.to_string(),
        reason: format!("{raw:?}: {e}"),
    })
}

fn parse_var_or<F, T>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => parse_var(var, &raw),
        None => Ok(default),
    }
}
