use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

/// Port the service listens on unless `APP__PORT` says otherwise.
pub const DEFAULT_PORT: u16 = 8083;

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub common: core_config::Config,
    pub store: StoreBackend,
    pub mongodb: MongoConfig,
    pub expiry_sweep_interval_secs: u64,
}

/// Which storage gateway backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongodb,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StoreBackend::Mongodb),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Invalid NOTIFICATION_STORE: {}. Must be one of: mongodb, memory",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// Full connection string; when set the parts below are ignored.
    pub uri: Option<String>,
    pub username: String,
    pub password: Secret<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub connect_timeout_secs: u64,
}

impl MongoConfig {
    /// Connection string built from the configured parts.
    pub fn connection_string(&self) -> String {
        if let Some(uri) = &self.uri {
            return uri.clone();
        }
        if self.username.is_empty() {
            format!("mongodb://{}:{}", self.host, self.port)
        } else {
            format!(
                "mongodb://{}:{}@{}:{}",
                self.username,
                self.password.expose_secret(),
                self.host,
                self.port
            )
        }
    }

    /// Same as [`connection_string`](Self::connection_string) with the
    /// password masked, for logs.
    pub fn redacted_connection_string(&self) -> String {
        match &self.uri {
            Some(_) => "mongodb://<from MONGODB_URI>".to_string(),
            None if self.username.is_empty() => format!("mongodb://{}:{}", self.host, self.port),
            None => format!("mongodb://{}:***@{}:{}", self.username, self.host, self.port),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl NotificationConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load(DEFAULT_PORT)?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(NotificationConfig {
            common: common_config,
            store: get_env("NOTIFICATION_STORE", Some("mongodb"), false)?.parse()?,
            mongodb: MongoConfig {
                uri: env::var("MONGODB_URI").ok().filter(|s| !s.is_empty()),
                username: get_env("DB_USERNAME", Some(""), false)?,
                password: Secret::new(get_env("DB_PASSWORD", Some(""), false)?),
                host: get_env("DB_HOST", Some("localhost"), is_prod)?,
                port: get_env_parsed("DB_PORT", "27017", is_prod)?,
                database: get_env("DB_DATABASE", Some("notification_db"), is_prod)?,
                connect_timeout_secs: get_env_parsed("DB_CONNECT_TIMEOUT_SECS", "10", false)?,
            },
            expiry_sweep_interval_secs: get_env_parsed("EXPIRY_SWEEP_INTERVAL_SECS", "60", false)?,
        })
    }

    pub fn expiry_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.expiry_sweep_interval_secs.max(1))
    }
}

/// Like [`get_env`] with a default, then parsed; a malformed value is an error.
fn get_env_parsed<T: std::str::FromStr>(
    key: &str,
    default: &str,
    is_prod: bool,
) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    let raw = get_env(key, Some(default), is_prod)?;
    raw.parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
    })
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
