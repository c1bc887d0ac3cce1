use crate::core::error::{Error, Result};
use dotenv::dotenv;
use std::env;
use std::time::Duration;
use tracing::info;
use validator::Validate;

#[derive(Debug, Clone, Validate)]
pub struct Config {
    #[validate(length(min = 1, message = "DATABASE_URL must not be empty"))]
    pub database_url: String,
    #[validate(range(min = 1, message = "MAX_DB_CONNECTIONS must be at least 1"))]
    pub max_connections: u32,
    /// 0 keeps connections for the lifetime of the pool.
    pub connection_lifetime_secs: u64,
    #[validate(range(min = 1, message = "DB_ACQUIRE_TIMEOUT_SECS must be at least 1"))]
    pub acquire_timeout_secs: u64,
    pub app_env: String,
    pub log_level: String,
}

impl Config {
    /// Carica la configurazione dalle variabili d'ambiente
    /// Chiama dotenv() automaticamente
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| Error::InvalidConfig("DATABASE_URL must be set in .env file".into()))?;

        let max_connections = parse_var("MAX_DB_CONNECTIONS", 10u32)?;
        let connection_lifetime_secs = parse_var("DB_CONNECTION_LIFETIME_SECS", 1800u64)?;
        let acquire_timeout_secs = parse_var("DB_ACQUIRE_TIMEOUT_SECS", 30u64)?;

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let config = Config {
            database_url,
            max_connections,
            connection_lifetime_secs,
            acquire_timeout_secs,
            app_env,
            log_level,
        };
        config.validate()?;
        Ok(config)
    }

    /// Configuration for a private in-memory SQLite database. A single
    /// connection that never expires, since every new connection would open
    /// an empty database.
    pub fn in_memory() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            connection_lifetime_secs: 0,
            acquire_timeout_secs: 30,
            app_env: "test".to_string(),
            log_level: "debug".to_string(),
        }
    }

    pub fn connection_lifetime(&self) -> Option<Duration> {
        (self.connection_lifetime_secs > 0)
            .then(|| Duration::from_secs(self.connection_lifetime_secs))
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Logga la configurazione (nascondendo le credenziali)
    pub fn log_summary(&self) {
        info!(
            environment = %self.app_env,
            database = %Self::mask_url(&self.database_url),
            max_connections = self.max_connections,
            connection_lifetime_secs = self.connection_lifetime_secs,
            acquire_timeout_secs = self.acquire_timeout_secs,
            "data access configuration"
        );
    }

    /// Maschera l'URL del database per il logging
    fn mask_url(url: &str) -> String {
        if let Some(at_pos) = url.rfind('@') {
            if let Some(scheme_end) = url.find("://") {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos..];
                return format!("{}***{}", scheme, after_at);
            }
        }
        if url.starts_with("sqlite:") {
            return url.to_string();
        }
        "***".to_string()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| Error::InvalidConfig(format!("Invalid {name}: `{raw}` is not a valid number"))),
        Err(_) => Ok(default),
    }
}
