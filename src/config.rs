use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, ConfigError, Environment, File};
use governor::{Quota, RateLimiter};
use sea_orm::Database;
use serde::Deserialize;
use tracing::{debug, info};

use crate::schemas::AppState;
use crate::services::provcity::{EmsifaClient, RegionDirectory};
use crate::uploads::MediaStore;

/// Deployment stage, selects `config/<stage>.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[serde(alias = "DEVELOPMENT")]
    Development,
    #[serde(alias = "TEST")]
    Test,
    #[serde(alias = "STAGING")]
    Staging,
    #[serde(alias = "PRODUCTION")]
    Production,
}

/// Runtime configuration, loaded once at startup and shared through `AppState`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Stage,
    pub version: String,
    pub database: DatabaseConfig,
    pub logger: LoggerConfig,
    pub auth: AuthConfig,
    pub rate_limiter: RateLimiterConfig,
    pub provcity: ProvcityConfig,
    pub uploads: UploadsConfig,
    pub shutdown: ShutdownConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggerConfig {
    /// `tracing_subscriber::EnvFilter` directive used when RUST_LOG is unset
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt: JwtConfig,
    pub basic: BasicAuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret_key: String,
    pub expire_in_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BasicAuthConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimiterConfig {
    pub rps: u32,
    pub bursts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvcityConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadsConfig {
    pub dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShutdownConfig {
    pub grace_period_secs: u64,
}

impl AppConfig {
    /// Reads defaults, `config/default.toml`, `config/<environment>.toml` and
    /// `EVERMOS__*` environment variables, later sources winning.
    pub fn load() -> Result<Self, ConfigError> {
        let stage = std::env::var("EVERMOS__ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8000)?
            .set_default("environment", "development")?
            .set_default("version", env!("CARGO_PKG_VERSION"))?
            .set_default("database.url", "sqlite://evermos.db?mode=rwc")?
            .set_default("logger.level", "info")?
            .set_default("auth.jwt.expire_in_minutes", 1000)?
            .set_default("rate_limiter.rps", 10)?
            .set_default("rate_limiter.bursts", 5)?
            .set_default(
                "provcity.base_url",
                "https://www.emsifa.com/api-wilayah-indonesia/api",
            )?
            .set_default("uploads.dir", "uploads")?
            .set_default("shutdown.grace_period_secs", 10)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", stage.to_lowercase())).required(false))
            .add_source(
                Environment::with_prefix("EVERMOS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Replaces `host` and `port` with an `IP:PORT` given on the command line.
    pub fn override_bind_address(&mut self, address: &str) -> Result<()> {
        let address: SocketAddr = address
            .parse()
            .with_context(|| format!("invalid bind address '{address}'"))?;
        self.host = address.ip().to_string();
        self.port = address.port();
        Ok(())
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.shutdown.grace_period_secs)
    }
}

/// Connects to the database and builds the shared state.
pub async fn initialize_app_state(config: AppConfig) -> Result<AppState> {
    info!("Connecting to database: {}", config.database.url);
    let db = Database::connect(&config.database.url)
        .await
        .with_context(|| format!("failed to connect to {}", config.database.url))?;

    let regions = EmsifaClient::new(&config.provcity.base_url)?;
    debug!("Province/city directory at {}", config.provcity.base_url);

    build_app_state(db, config, Arc::new(regions))
}

/// Assembles `AppState` from already constructed collaborators.
pub fn build_app_state(
    db: sea_orm::DatabaseConnection,
    config: AppConfig,
    regions: Arc<dyn RegionDirectory>,
) -> Result<AppState> {
    let rps = NonZeroU32::new(config.rate_limiter.rps).context("rate_limiter.rps must be positive")?;
    let bursts =
        NonZeroU32::new(config.rate_limiter.bursts).context("rate_limiter.bursts must be positive")?;
    let rate_limiter = RateLimiter::direct(Quota::per_second(rps).allow_burst(bursts));

    let media = MediaStore::new(&config.uploads.dir);

    Ok(AppState {
        db,
        config: Arc::new(config),
        rate_limiter: Arc::new(rate_limiter),
        regions,
        media,
    })
}

#[cfg(test)]
mod tests {
    use crate::test_utils::test_config;

    #[test]
    fn bind_address_override_replaces_host_and_port() {
        let mut config = test_config();
        config.override_bind_address("127.0.0.1:9100").unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9100");
    }

    #[test]
    fn malformed_bind_address_is_rejected() {
        let mut config = test_config();
        assert!(config.override_bind_address("localhost").is_err());
        assert_eq!(config.port, test_config().port);
    }
}
