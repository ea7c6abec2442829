//! Runtime configuration read from the environment (after `.env`).

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;
use crate::domain::aggregates::CartPricing;
use crate::domain::value_objects::Money;

pub const DEFAULT_PORT: u16 = 8083;
pub const DEFAULT_SESSION_COOKIE: &str = "ivma_session";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub nats_url: Option<String>,
    pub session_cookie: String,
    pub pricing: CartPricing,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let port = parse(&get, "PORT")?.unwrap_or(DEFAULT_PORT);
        let db_max_connections = parse(&get, "DB_MAX_CONNECTIONS")?.unwrap_or(10);
        if db_max_connections == 0 {
            return Err(ConfigError::Invalid { name: "DB_MAX_CONNECTIONS", value: "0".into() });
        }
        let tax_rate: Decimal = parse(&get, "TAX_RATE")?.unwrap_or_default();
        if tax_rate.is_sign_negative() || tax_rate >= Decimal::ONE {
            return Err(ConfigError::Invalid { name: "TAX_RATE", value: tax_rate.to_string() });
        }
        let shipping_fee: Decimal = parse(&get, "SHIPPING_FEE_PER_STORE")?.unwrap_or_default();
        if shipping_fee.is_sign_negative() {
            return Err(ConfigError::Invalid { name: "SHIPPING_FEE_PER_STORE", value: shipping_fee.to_string() });
        }

        Ok(Self {
            database_url,
            port,
            db_max_connections,
            nats_url: get("NATS_URL"),
            session_cookie: get("SESSION_COOKIE").unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string()),
            pricing: CartPricing { tax_rate, shipping_fee_per_store: Money::new(shipping_fee) },
        })
    }
}

fn parse<T: FromStr>(get: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<T>, ConfigError> {
    get(name)
        .map(|value| value.parse().map_err(|_| ConfigError::Invalid { name, value }))
        .transpose()
}
