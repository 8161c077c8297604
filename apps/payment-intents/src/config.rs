use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use security::SecretValue;

use crate::client::DEFAULT_API_BASE;

pub const DEFAULT_BIND: &str = "0.0.0.0:8081";
pub const DEFAULT_CURRENCY: &str = "eur";
pub const DEFAULT_DESCRIPTION: &str = "Thanks for your purchase";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5174";

#[derive(Debug, Clone)]
pub struct PaymentsConfig {
    pub addr: SocketAddr,
    pub api_key: SecretValue,
    pub api_base: String,
    pub currency: String,
    pub description: String,
    pub receipt_email: Option<String>,
    /// Frontend origins allowed to call the checkout endpoint.
    pub allowed_origins: Vec<String>,
}

impl PaymentsConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = lookup("BIND")
            .unwrap_or_else(|| DEFAULT_BIND.into())
            .parse()
            .context("invalid BIND address")?;

        let api_key = lookup("PAYHOOK_GATEWAY_API_KEY")
            .or_else(|| lookup("STRIPE_API_KEY"))
            .map(SecretValue::new)
            .filter(|key| !key.is_empty())
            .context("PAYHOOK_GATEWAY_API_KEY required")?;

        let currency = lookup("PAYHOOK_CURRENCY")
            .map(|raw| raw.trim().to_ascii_lowercase())
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.into());

        let allowed_origins = lookup("PAYHOOK_ALLOWED_ORIGIN")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.into())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect();

        Ok(Self {
            addr,
            api_key,
            api_base: lookup("PAYHOOK_GATEWAY_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.into()),
            currency,
            description: lookup("PAYHOOK_PAYMENT_DESCRIPTION")
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.into()),
            receipt_email: lookup("PAYHOOK_RECEIPT_EMAIL").filter(|email| !email.trim().is_empty()),
            allowed_origins,
        })
    }
}
