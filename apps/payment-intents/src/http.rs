use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::cart::CreatePaymentIntentRequest;
use crate::client::{PaymentIntentClient, PaymentIntentParams};
use crate::config::PaymentsConfig;

pub const CREATE_PATH: &str = "/create-payment-intent";
pub const INTENTS_COUNTER: &str = "payhook_payment_intents_total";

/// Per-checkout values that do not come from the shopper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    pub currency: String,
    pub description: String,
    pub receipt_email: Option<String>,
}

impl From<&PaymentsConfig> for CheckoutSettings {
    fn from(config: &PaymentsConfig) -> Self {
        Self {
            currency: config.currency.clone(),
            description: config.description.clone(),
            receipt_email: config.receipt_email.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn PaymentIntentClient>,
    pub checkout: CheckoutSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedResponse {
    client_secret: String,
}

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route(CREATE_PATH, post(create_payment_intent))
        .layer(cors)
        .with_state(state)
}

/// Browser access for the checkout frontend; an empty list allows any origin.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let layer = CorsLayer::new()
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(600));
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

async fn create_payment_intent(
    State(state): State<AppState>,
    payload: Result<Json<CreatePaymentIntentRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return failed("invalid_request", rejection.body_text()),
    };

    let amount = match request.total_amount() {
        Ok(amount) => amount,
        Err(err) => return failed("invalid_cart", err.to_string()),
    };

    let params = PaymentIntentParams {
        amount,
        currency: state.checkout.currency.clone(),
        description: state.checkout.description.clone(),
        receipt_email: state.checkout.receipt_email.clone(),
    };

    match state.client.create(params).await {
        Ok(created) => {
            tracing::info!(
                payment_intent = %created.id,
                amount,
                currency = %state.checkout.currency,
                items = request.items.len(),
                "payment intent created"
            );
            record("created");
            (
                StatusCode::OK,
                Json(CreatedResponse {
                    client_secret: created.client_secret,
                }),
            )
                .into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, amount, "payment intent creation failed");
            failed("gateway_error", err.to_string())
        }
    }
}

fn failed(outcome: &'static str, reason: String) -> Response {
    record(outcome);
    (
        StatusCode::BAD_REQUEST,
        format!("Failed to create PaymentIntent: {reason}"),
    )
        .into_response()
}

fn record(outcome: &'static str) {
    metrics::counter!(INTENTS_COUNTER, "outcome" => outcome).increment(1);
}
