use std::sync::Arc;

use axum::{
    Extension, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    middleware,
    response::{IntoResponse, Response},
    routing::post,
};

use crate::endpoint::WebhookEndpoint;
use crate::reqid::{RequestId, with_request_id};

pub const WEBHOOK_PATH: &str = "/webhook";
pub const SIGNATURE_HEADER: &str = "signature";
/// Header name used by the gateway's hosted webhooks; accepted when `Signature` is absent.
pub const GATEWAY_SIGNATURE_HEADER: &str = "stripe-signature";

pub fn build_router(endpoint: Arc<WebhookEndpoint>) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(handle))
        .layer(middleware::from_fn(with_request_id))
        .with_state(endpoint)
}

async fn handle(
    State(endpoint): State<Arc<WebhookEndpoint>>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let span = tracing::info_span!("webhook", request_id = %request_id);
    span.in_scope(|| endpoint.handle(&body, signature_from(&headers)))
        .into_response()
}

fn signature_from(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SIGNATURE_HEADER)
        .or_else(|| headers.get(GATEWAY_SIGNATURE_HEADER))
        .and_then(|value| value.to_str().ok())
}
