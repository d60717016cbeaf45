use serde::{Deserialize, Serialize};
use std::{env, fmt, path::PathBuf};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Document store configuration
    pub store: StoreConfig,
    /// Token authentication configuration
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// PostgREST base URL; when unset the in-memory store is used
    pub url: Option<String>,
    pub key: Option<String>,
    /// JSON fixture loaded into the in-memory store at startup
    pub seed_file: Option<PathBuf>,
}

/// Signing secret and token lifetime, fixed for the lifetime of the service
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration_time_ms: u64,
}

// Keep the secret out of startup logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("expiration_time_ms", &self.expiration_time_ms)
            .finish()
    }
}

pub const DEFAULT_EXPIRATION_TIME_MS: u64 = 24 * 60 * 60 * 1000;

impl AuthConfig {
    pub fn new(secret: impl Into<String>, expiration_time_ms: u64) -> Self {
        Self {
            secret: secret.into(),
            expiration_time_ms,
        }
    }
}

impl StoreConfig {
    /// Whether a remote document store is configured
    pub fn is_remote(&self) -> bool {
        self.url.as_deref().is_some_and(|url| !url.is_empty())
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid PORT value"))?,
                cors_origins: env::var("CORS_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            store: StoreConfig {
                url: env::var("STORE_URL").ok().filter(|s| !s.is_empty()),
                key: env::var("STORE_KEY").ok().filter(|s| !s.is_empty()),
                seed_file: env::var("STORE_SEED_FILE").ok().map(PathBuf::from),
            },
            auth: AuthConfig {
                secret: env::var("AUTH_SECRET")
                    .map_err(|_| anyhow::anyhow!("AUTH_SECRET is required"))?,
                expiration_time_ms: env::var("AUTH_EXPIRATION_TIME")
                    .ok()
                    .map(|v| {
                        v.parse()
                            .map_err(|_| anyhow::anyhow!("Invalid AUTH_EXPIRATION_TIME value"))
                    })
                    .transpose()?
                    .unwrap_or(DEFAULT_EXPIRATION_TIME_MS),
            },
        };

        if config.auth.secret.is_empty() {
            anyhow::bail!("AUTH_SECRET must not be empty");
        }
        if config.store.is_remote() && config.store.key.is_none() {
            anyhow::bail!("STORE_KEY is required when STORE_URL is set");
        }

        Ok(config)
    }
}
