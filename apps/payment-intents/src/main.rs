use std::sync::Arc;

use anyhow::Result;
use payhook_telemetry::{TelemetryConfig, init_telemetry};
use payment_intents::{
    AppState, CheckoutSettings, HttpPaymentIntentClient, PaymentsConfig, build_router, cors_layer,
};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env("payhook-payment-intents", env!("CARGO_PKG_VERSION"));
    init_telemetry(&telemetry)?;

    let config = PaymentsConfig::from_env()?;
    let client = HttpPaymentIntentClient::new(
        reqwest::Client::new(),
        Some(config.api_base.clone()),
        config.api_key.clone(),
    );
    let state = AppState {
        client: Arc::new(client),
        checkout: CheckoutSettings::from(&config),
    };
    info!(
        currency = %config.currency,
        allowed_origins = ?config.allowed_origins,
        "payment intent endpoint configured"
    );

    let app = build_router(state, cors_layer(&config.allowed_origins));
    let listener = TcpListener::bind(config.addr).await?;
    info!("payment-intents listening on {}", config.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
