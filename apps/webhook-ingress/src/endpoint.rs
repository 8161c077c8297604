//! One webhook delivery: verify, decode, dispatch, answer.
//!
//! The gateway only distinguishes 200 (stop retrying) from 400 (may retry). Signature and
//! envelope failures are the only 400s; everything past decoding is acknowledged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use security::{EventDecoder, SignatureError, SignatureVerifier};
use time::OffsetDateTime;

use crate::config::WebhookConfig;
use crate::router::{DispatchOutcome, EventRouter};

pub const ACK_BODY: &str = "Webhook processed successfully";
pub const DECODE_ERROR_BODY: &str = "Deserialization error";
pub const REQUESTS_COUNTER: &str = "payhook_webhook_requests_total";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookReply {
    pub status: StatusCode,
    pub body: String,
    /// Present whenever the event reached the router.
    pub dispatch: Option<DispatchOutcome>,
}

impl WebhookReply {
    fn rejected(body: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body,
            dispatch: None,
        }
    }

    fn acknowledged(dispatch: DispatchOutcome) -> Self {
        Self {
            status: StatusCode::OK,
            body: ACK_BODY.to_string(),
            dispatch: Some(dispatch),
        }
    }
}

impl IntoResponse for WebhookReply {
    fn into_response(self) -> Response {
        (self.status, self.body).into_response()
    }
}

#[derive(Clone)]
pub struct WebhookEndpoint {
    verifier: SignatureVerifier,
    router: EventRouter,
}

impl WebhookEndpoint {
    pub fn new(verifier: SignatureVerifier, router: EventRouter) -> Self {
        Self { verifier, router }
    }

    pub fn from_config(config: &WebhookConfig) -> Self {
        Self::new(
            SignatureVerifier::new(config.webhook_secret.clone(), config.tolerance_secs),
            EventRouter::with_payment_handlers(config.display_offset),
        )
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    pub fn handle(&self, payload: &[u8], signature: Option<&str>) -> WebhookReply {
        self.handle_at(payload, signature, OffsetDateTime::now_utc().unix_timestamp())
    }

    pub fn handle_at(&self, payload: &[u8], signature: Option<&str>, now: i64) -> WebhookReply {
        let verified = match signature
            .ok_or(SignatureError::Malformed("missing signature header"))
            .and_then(|header| self.verifier.verify_payload_at(payload, header, now))
        {
            Ok(verified) => verified,
            Err(err) => {
                tracing::error!(error = %err, "signature verification failed");
                record_request("rejected_signature");
                return WebhookReply::rejected(format!("Webhook error: {err}"));
            }
        };

        let event = match EventDecoder::decode(verified) {
            Ok(event) => event,
            Err(err) => {
                tracing::error!(error = %err, "event deserialization failed");
                record_request("rejected_payload");
                return WebhookReply::rejected(DECODE_ERROR_BODY.to_string());
            }
        };

        tracing::info!(
            event_kind = %event.kind(),
            event_id = event.id(),
            livemode = event.livemode(),
            "webhook event verified"
        );
        let dispatch = self.router.dispatch(&event);
        record_request("accepted");
        WebhookReply::acknowledged(dispatch)
    }
}

fn record_request(outcome: &'static str) {
    metrics::counter!(REQUESTS_COUNTER, "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use payhook_core::PaymentObservation;
    use security::{SecretValue, signature_header};
    use time::UtcOffset;

    const SECRET: &str = "whsec_endpoint";
    const NOW: i64 = 1_700_000_000;

    fn endpoint() -> WebhookEndpoint {
        WebhookEndpoint::new(
            SignatureVerifier::new(SecretValue::new(SECRET), 300),
            EventRouter::with_payment_handlers(UtcOffset::UTC),
        )
    }

    #[test]
    fn missing_signature_is_rejected() {
        let reply = endpoint().handle_at(b"{}", None, NOW);
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            reply.body,
            "Webhook error: unable to parse signature header: missing signature header"
        );
        assert_eq!(reply.dispatch, None);
    }

    #[test]
    fn stale_signature_is_rejected() {
        let payload = br#"{"type":"payment_intent.succeeded","data":{"object":{"id":"pi_1","amount":1}}}"#;
        let header = signature_header(payload, SECRET, NOW - 301).unwrap();
        let reply = endpoint().handle_at(payload, Some(header.as_str()), NOW);
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(reply.body.starts_with("Webhook error: timestamp outside the tolerance zone"));
    }

    #[test]
    fn failed_payment_without_error_reports_unknown_error() {
        let payload = br#"{"type":"payment_intent.payment_failed","data":{"object":{"id":"pi_7","status":"requires_payment_method"}}}"#;
        let header = signature_header(payload, SECRET, NOW).unwrap();
        let reply = endpoint().handle_at(payload, Some(header.as_str()), NOW);
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, ACK_BODY);
        match reply.dispatch {
            Some(DispatchOutcome::Handled {
                observation: PaymentObservation::Failed(failure),
                ..
            }) => {
                assert_eq!(failure.id, "pi_7");
                assert_eq!(failure.message, "Unknown error");
            }
            other => panic!("unexpected dispatch {other:?}"),
        }
    }
}
