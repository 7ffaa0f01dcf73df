//! Configuration loaded from the environment (and `.env` via dotenvy).

use std::env;
use std::str::FromStr;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use crate::domain::aggregates::ShippingPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP port (default 8083)
    pub port: u16,
    /// Postgres URL. Without it state is kept in memory.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// NATS URL for domain events
    pub nats_url: Option<String>,
    pub event_subject_prefix: String,
    pub currency: String,
    /// Shipping is free strictly above this subtotal
    pub free_shipping_threshold: Decimal,
    pub flat_shipping_fee: Decimal,
    pub delivery_estimate_days: i64,
    /// Attempts per read-modify-write before giving up on a conflict
    pub store_max_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8083,
            database_url: None,
            database_max_connections: 10,
            nats_url: None,
            event_subject_prefix: "areca".into(),
            currency: "INR".into(),
            free_shipping_threshold: Decimal::new(500, 0),
            flat_shipping_fee: Decimal::new(40, 0),
            delivery_estimate_days: 3,
            store_max_attempts: 5,
        }
    }
}

fn parsed<T: FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().with_context(|| format!("Failed to parse {name}")),
        Err(_) => Ok(default),
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            port: parsed("PORT", defaults.port)?,
            database_url: optional("DATABASE_URL"),
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", defaults.database_max_connections)?,
            nats_url: optional("NATS_URL"),
            event_subject_prefix: optional("EVENT_SUBJECT_PREFIX").unwrap_or(defaults.event_subject_prefix),
            currency: optional("CURRENCY").unwrap_or(defaults.currency),
            free_shipping_threshold: parsed("FREE_SHIPPING_THRESHOLD", defaults.free_shipping_threshold)?,
            flat_shipping_fee: parsed("FLAT_SHIPPING_FEE", defaults.flat_shipping_fee)?,
            delivery_estimate_days: parsed("DELIVERY_ESTIMATE_DAYS", defaults.delivery_estimate_days)?,
            store_max_attempts: parsed("STORE_MAX_ATTEMPTS", defaults.store_max_attempts)?,
        })
    }

    pub fn shipping_policy(&self) -> ShippingPolicy {
        ShippingPolicy { free_above: self.free_shipping_threshold, flat_fee: self.flat_shipping_fee, currency: self.currency.clone() }
    }
}
