//! Environment-driven settings for the rating server.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::warn;

use crate::errors::ServerError;

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Default size of the PostgreSQL connection pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
const DEFAULT_SERVER_PORT: u16 = 8080;

/// Origins allowed by CORS when `CORS_ALLOWED_ORIGINS` is not set.
const DEFAULT_CORS_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

/// Where votes and writeups are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// Process-local storage, lost on restart.
    Memory,
}

/// Connection mode for PostgreSQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection every retry interval until successful.
    Retry,
}

/// Console log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self, ServerError> {
        match value.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" | "in-memory" => Ok(Self::Memory),
            other => Err(ServerError::config(format!(
                "Invalid STORAGE_BACKEND '{other}', expected 'postgres' or 'memory'"
            ))),
        }
    }
}

impl ConnectionMode {
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Anything else falls back to "retry".
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid DATABASE_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

impl LogFormat {
    pub fn from_env() -> Self {
        match env::var("LOG_FORMAT") {
            Ok(value) if value.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Everything the server reads from its environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub max_conflict_retries: usize,
    /// Raw `token=voter_id:role` list, parsed by the auth provider.
    pub auth_tokens: String,
    pub cors_allowed_origins: Vec<String>,
}

impl Settings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `STORAGE_BACKEND`: "postgres" or "memory" (default: postgres)
    /// - `DATABASE_URL`: PostgreSQL connection string, required for the postgres backend
    /// - `DATABASE_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `DATABASE_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
    /// - `SERVER_HOST` / `SERVER_PORT`: Listen address (default: 0.0.0.0:8080)
    /// - `VOTE_MAX_CONFLICT_RETRIES`: Retries after a write conflict (default: 3)
    /// - `AUTH_TOKENS`: Comma separated `token=voter_id:role` entries
    /// - `CORS_ALLOWED_ORIGINS`: Comma separated origins (default: localhost dev servers)
    pub fn from_env() -> Result<Self, ServerError> {
        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => StorageBackend::parse(&value)?,
            Err(_) => StorageBackend::Postgres,
        };

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(ServerError::config(
                "DATABASE_URL must be set for the postgres backend",
            ));
        }

        let connection_mode = env::var("DATABASE_CONNECTION_MODE")
            .map(|value| ConnectionMode::parse(&value))
            .unwrap_or(ConnectionMode::Retry);
        let retry_interval = env::var("DATABASE_RETRY_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_INTERVAL_SECS);
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let host = env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string());
        let port = match env::var("SERVER_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|e| ServerError::config(format!("Invalid SERVER_PORT '{value}': {e}")))?,
            Err(_) => DEFAULT_SERVER_PORT,
        };

        let max_conflict_retries = match env::var("VOTE_MAX_CONFLICT_RETRIES") {
            Ok(value) => value.parse::<usize>().map_err(|e| {
                ServerError::config(format!("Invalid VOTE_MAX_CONFLICT_RETRIES '{value}': {e}"))
            })?,
            Err(_) => rating_engine::service::DEFAULT_MAX_CONFLICT_RETRIES,
        };

        let auth_tokens = env::var("AUTH_TOKENS").unwrap_or_default();
        let cors_allowed_origins = match env::var("CORS_ALLOWED_ORIGINS") {
            Ok(value) => value
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self {
            storage_backend,
            database_url,
            connection_mode,
            retry_interval: Duration::from_secs(retry_interval),
            max_connections,
            host,
            port,
            max_conflict_retries,
            auth_tokens,
            cors_allowed_origins,
        })
    }

    /// The socket address to bind.
    pub fn listen_addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ServerError::config(format!("Invalid listen address: {e}")))
    }
}
