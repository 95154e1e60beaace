//! API configuration module.
//!
//! Configuration is layered with the `config` crate:
//!
//! ```text
//! defaults (below)
//!    ▲ overridden by
//! mesa.toml, or the file named by MESA_CONFIG (optional)
//!    ▲ overridden by
//! MESA__SECTION__KEY environment variables (e.g. MESA__SERVER__PORT=9000)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Default configuration file, looked up in the working directory.
const DEFAULT_CONFIG_FILE: &str = "mesa.toml";

/// API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    pub summary: SummaryConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`.
    pub path: PathBuf,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for signing session tokens
    pub jwt_secret: String,

    /// Session token lifetime in seconds
    pub token_lifetime_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    /// Processor REST base URL
    pub api_base_url: String,

    pub timeout_secs: u64,

    /// When set, webhook calls must carry a valid `x-signature`.
    pub webhook_secret: Option<String>,

    /// Clear a paid table as soon as its payment is approved.
    pub liberate_tables_on_payment: bool,

    /// Public URL of `/api/pagos/webhook`, sent with each checkout preference.
    pub notification_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Most recent incomes/expenses listed in the payments summary.
    pub recent_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl AppConfig {
    /// Loads configuration from defaults, the optional file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("MESA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let config = Self::builder()?
            .add_source(File::with_name(&file).required(false))
            .add_source(Environment::with_prefix("MESA").prefix_separator("__").separator("__"))
            .build()?
            .try_deserialize::<AppConfig>()?;

        config.validate()?;
        Ok(config)
    }

    /// Defaults only. Used by tests.
    pub fn defaults() -> Result<Self, ConfigError> {
        let config = Self::builder()?.build()?.try_deserialize::<AppConfig>()?;
        config.validate()?;
        Ok(config)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.path", "mesa.db")?
            .set_default("database.max_connections", 5)?
            .set_default("auth.jwt_secret", "mesa-dev-secret-change-in-production")?
            .set_default("auth.token_lifetime_secs", 43_200)?
            .set_default("payments.api_base_url", "https://api.mercadopago.com")?
            .set_default("payments.timeout_secs", 10)?
            .set_default("payments.liberate_tables_on_payment", false)?
            .set_default("summary.recent_limit", mesa_core::DEFAULT_RECENT_LIMIT as i64)?
            .set_default("log.filter", "info,mesa_api=debug,mesa_db=info")?;
        Ok(builder)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue("server.port".to_string()));
        }
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string()));
        }
        if self.auth.token_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("auth.token_lifetime_secs".to_string()));
        }
        if self.payments.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("payments.timeout_secs".to_string()));
        }
        Ok(())
    }

    /// Socket address the server binds to.
    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("server.host".to_string()))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),
}
