use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
    pub log_format: LogFormat,
    /// Filter used when `RUST_LOG` is unset or invalid.
    pub default_filter: String,
}

impl TelemetryConfig {
    pub fn from_env(default_service_name: &str, default_service_version: &str) -> Self {
        Self::from_lookup(default_service_name, default_service_version, |key| {
            env::var(key).ok()
        })
    }

    pub fn from_lookup<F>(
        default_service_name: &str,
        default_service_version: &str,
        lookup: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let service_name =
            lookup("SERVICE_NAME").unwrap_or_else(|| default_service_name.to_string());
        let service_version =
            lookup("SERVICE_VERSION").unwrap_or_else(|| default_service_version.to_string());
        let environment = lookup("DEPLOYMENT_ENV").unwrap_or_else(|| "dev".into());
        let log_format = lookup("LOG_FORMAT")
            .map(|v| match v.to_lowercase().as_str() {
                "text" | "pretty" | "plain" => LogFormat::Text,
                _ => LogFormat::Json,
            })
            .unwrap_or(LogFormat::Json);
        let default_filter = lookup("LOG_LEVEL").unwrap_or_else(|| "info".into());

        Self {
            service_name,
            service_version,
            environment,
            log_format,
            default_filter,
        }
    }
}
