//! Application configuration, read from `STOREFRONT_*` environment variables.

use crate::checkout::DEFAULT_EXPRESS_FEE;
use crate::settings::{Currency, Settings, DEFAULT_EXCHANGE_RATE};
use crate::store::models::Money;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: Decimal,
    #[serde(default)]
    pub default_currency: Currency,
    #[serde(default = "default_express_fee")]
    pub express_shipping_fee: Money,
    /// Sessions unused for this long are dropped
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
    #[serde(default = "default_session_sweep_secs")]
    pub session_sweep_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            exchange_rate: default_exchange_rate(),
            default_currency: Currency::default(),
            express_shipping_fee: default_express_fee(),
            session_idle_secs: default_session_idle_secs(),
            session_sweep_secs: default_session_sweep_secs(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(config::Environment::with_prefix("STOREFRONT").try_parsing(true))
    }

    fn from_source<S>(source: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::io::Error> {
        let host = self.host.parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid host {:?}: {}", self.host, e),
            )
        })?;
        Ok(SocketAddr::new(host, self.port))
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    /// Period of the idle-session sweep, never zero
    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_secs.max(1))
    }

    /// Settings every new session starts with
    pub fn session_settings(&self) -> Settings {
        Settings::new(self.default_currency, self.exchange_rate)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_exchange_rate() -> Decimal {
    DEFAULT_EXCHANGE_RATE
}

fn default_express_fee() -> Money {
    DEFAULT_EXPRESS_FEE
}

fn default_session_idle_secs() -> u64 {
    30 * 60
}

fn default_session_sweep_secs() -> u64 {
    60
}
