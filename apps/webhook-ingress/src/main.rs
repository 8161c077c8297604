use std::sync::Arc;

use anyhow::Result;
use payhook_telemetry::{TelemetryConfig, init_telemetry};
use tokio::net::TcpListener;
use tracing::info;
use webhook_ingress::{WebhookConfig, WebhookEndpoint, build_router};

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env("payhook-webhook-ingress", env!("CARGO_PKG_VERSION"));
    init_telemetry(&telemetry)?;

    let config = WebhookConfig::from_env()?;
    let endpoint = Arc::new(WebhookEndpoint::from_config(&config));
    let kinds: Vec<&str> = endpoint.router().kinds().collect();
    info!(
        tolerance_secs = config.tolerance_secs,
        handled_kinds = ?kinds,
        "webhook handlers registered"
    );

    let app = build_router(endpoint.clone());
    let listener = TcpListener::bind(config.addr).await?;
    info!("webhook-ingress listening on {}", config.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
