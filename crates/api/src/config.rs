use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

/// Where refresh-token lifecycle state lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenStore {
    /// One `authentications` row per issued token.
    Database,
    /// Allow/deny markers in the cache.
    Cache,
}

impl FromStr for RefreshTokenStore {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "database" | "db" => Ok(Self::Database),
            "cache" => Ok(Self::Cache),
            other => Err(format!(
                "unknown refresh token store '{other}', expected 'database' or 'cache'"
            )),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secrets have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time allowed for background tasks to stop after shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Redis connection URL. When unset, an in-process cache is used.
    pub redis_url: Option<String>,
    /// Maximum pooled Redis connections (default: `16`).
    pub redis_pool_size: usize,
    /// Refresh-token lifecycle backend (default: `database`).
    pub refresh_token_store: RefreshTokenStore,
    /// JWT token configuration (secrets, expiry durations).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `REDIS_URL`            | unset (in-process cache)   |
    /// | `REDIS_POOL_SIZE`      | `16`                       |
    /// | `REFRESH_TOKEN_STORE`  | `database`                 |
    ///
    /// JWT settings are read by [`JwtConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics on unparseable values and on missing JWT secrets.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let redis_url = std::env::var("REDIS_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let redis_pool_size: usize = std::env::var("REDIS_POOL_SIZE")
            .unwrap_or_else(|_| "16".into())
            .parse()
            .expect("REDIS_POOL_SIZE must be a valid usize");

        let refresh_token_store: RefreshTokenStore = std::env::var("REFRESH_TOKEN_STORE")
            .unwrap_or_else(|_| "database".into())
            .parse()
            .unwrap_or_else(|e| panic!("REFRESH_TOKEN_STORE: {e}"));

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            redis_url,
            redis_pool_size,
            refresh_token_store,
            jwt,
        }
    }
}
