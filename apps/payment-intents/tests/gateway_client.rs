use std::collections::HashMap;

use axum::{
    Form, Json, Router,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use payment_intents::{GatewayError, HttpPaymentIntentClient, PaymentIntentClient, PaymentIntentParams};
use security::SecretValue;
use serde_json::json;
use tokio::net::TcpListener;

const API_KEY: &str = "sk_test_mock";

async fn mock_create(headers: HeaderMap, Form(form): Form<HashMap<String, String>>) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some("Bearer sk_test_mock");
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"message": "Invalid API Key provided"}})),
        )
            .into_response();
    }
    if form.get("automatic_payment_methods[enabled]").map(String::as_str) != Some("true") {
        return (StatusCode::BAD_REQUEST, "missing payment methods").into_response();
    }
    let amount = form.get("amount").cloned().unwrap_or_default();
    if amount == "666" {
        return (
            StatusCode::PAYMENT_REQUIRED,
            Json(json!({"error": {"message": "Your card was declined.", "code": "card_declined"}})),
        )
            .into_response();
    }
    Json(json!({
        "id": format!("pi_{amount}"),
        "object": "payment_intent",
        "client_secret": format!("pi_{amount}_secret_{}", form.get("currency").cloned().unwrap_or_default()),
    }))
    .into_response()
}

async fn spawn_gateway() -> String {
    let app = Router::new().route("/v1/payment_intents", post(mock_create));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn params(amount: i64) -> PaymentIntentParams {
    PaymentIntentParams {
        amount,
        currency: "eur".into(),
        description: "Thanks for your purchase".into(),
        receipt_email: None,
    }
}

fn client(base: String, key: &str) -> HttpPaymentIntentClient {
    HttpPaymentIntentClient::new(reqwest::Client::new(), Some(base), SecretValue::new(key))
}

#[tokio::test]
async fn creates_intent_with_form_body() {
    let base = spawn_gateway().await;
    let created = client(base, API_KEY).create(params(1000)).await.unwrap();
    assert_eq!(created.id, "pi_1000");
    assert_eq!(created.client_secret, "pi_1000_secret_eur");
}

#[tokio::test]
async fn surfaces_gateway_error_message() {
    let base = spawn_gateway().await;
    let err = client(base, API_KEY).create(params(666)).await.unwrap_err();
    match err {
        GatewayError::Rejected { status, message } => {
            assert_eq!(status, 402);
            assert_eq!(message, "Your card was declined.");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn wrong_key_is_rejected() {
    let base = spawn_gateway().await;
    let err = client(base, "sk_wrong").create(params(1000)).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid API Key provided");
}

#[tokio::test]
async fn unreachable_gateway_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = client(format!("http://{addr}"), API_KEY)
        .create(params(1000))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));
}
