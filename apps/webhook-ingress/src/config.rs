use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use payhook_core::parse_utc_offset;
use security::{DEFAULT_TOLERANCE_SECS, SecretValue};
use time::UtcOffset;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Process-wide configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub addr: SocketAddr,
    pub webhook_secret: SecretValue,
    pub tolerance_secs: u64,
    /// Offset used when rendering payment timestamps in logs.
    pub display_offset: UtcOffset,
}

impl WebhookConfig {
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

        let webhook_secret = lookup("PAYHOOK_WEBHOOK_SECRET")
            .or_else(|| lookup("STRIPE_WEBHOOK_SECRET"))
            .map(SecretValue::new)
            .filter(|secret| !secret.is_empty())
            .context("PAYHOOK_WEBHOOK_SECRET required")?;

        let tolerance_secs = match lookup("PAYHOOK_SIGNATURE_TOLERANCE_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("invalid PAYHOOK_SIGNATURE_TOLERANCE_SECS `{raw}`"))?,
            None => DEFAULT_TOLERANCE_SECS,
        };

        let display_offset = match lookup("PAYHOOK_DISPLAY_UTC_OFFSET") {
            Some(raw) => parse_utc_offset(&raw).context("invalid PAYHOOK_DISPLAY_UTC_OFFSET")?,
            None => UtcOffset::UTC,
        };

        Ok(Self {
            addr,
            webhook_secret,
            tolerance_secs,
            display_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let cfg = WebhookConfig::from_lookup(lookup(&[("PAYHOOK_WEBHOOK_SECRET", "whsec_1")]))
            .expect("config");
        assert_eq!(cfg.addr, DEFAULT_BIND.parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.webhook_secret.expose(), "whsec_1");
        assert_eq!(cfg.tolerance_secs, 300);
        assert_eq!(cfg.display_offset, UtcOffset::UTC);
    }

    #[test]
    fn falls_back_to_gateway_secret_name() {
        let cfg = WebhookConfig::from_lookup(lookup(&[("STRIPE_WEBHOOK_SECRET", "whsec_2")]))
            .expect("config");
        assert_eq!(cfg.webhook_secret.expose(), "whsec_2");
    }

    #[test]
    fn requires_non_empty_secret() {
        assert!(WebhookConfig::from_lookup(lookup(&[])).is_err());
        assert!(WebhookConfig::from_lookup(lookup(&[("PAYHOOK_WEBHOOK_SECRET", "  ")])).is_err());
    }

    #[test]
    fn reads_overrides_and_rejects_bad_values() {
        let cfg = WebhookConfig::from_lookup(lookup(&[
            ("PAYHOOK_WEBHOOK_SECRET", "whsec_1"),
            ("BIND", "127.0.0.1:9000"),
            ("PAYHOOK_SIGNATURE_TOLERANCE_SECS", "60"),
            ("PAYHOOK_DISPLAY_UTC_OFFSET", "+01:00"),
        ]))
        .expect("config");
        assert_eq!(cfg.addr.port(), 9000);
        assert_eq!(cfg.tolerance_secs, 60);
        assert_eq!(cfg.display_offset.whole_hours(), 1);

        assert!(
            WebhookConfig::from_lookup(lookup(&[
                ("PAYHOOK_WEBHOOK_SECRET", "whsec_1"),
                ("PAYHOOK_SIGNATURE_TOLERANCE_SECS", "-5"),
            ]))
            .is_err()
        );
        assert!(
            WebhookConfig::from_lookup(lookup(&[
                ("PAYHOOK_WEBHOOK_SECRET", "whsec_1"),
                ("BIND", "not-an-addr"),
            ]))
            .is_err()
        );
    }

    #[test]
    fn debug_output_redacts_secret() {
        let cfg = WebhookConfig::from_lookup(lookup(&[("PAYHOOK_WEBHOOK_SECRET", "whsec_hidden")]))
            .expect("config");
        assert!(!format!("{cfg:?}").contains("whsec_hidden"));
    }
}
