use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use payhook_core::{KnownKind, PaymentObservation};
use security::VerifiedEvent;
use time::UtcOffset;

use crate::handlers::{EventHandler, FailedHandler, SucceededHandler};

pub const EVENTS_COUNTER: &str = "payhook_webhook_events_total";

pub type SharedHandler = Arc<dyn EventHandler>;

/// Result of routing one event. Every variant is acknowledged to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled {
        kind: String,
        observation: PaymentObservation,
    },
    Unhandled {
        kind: String,
    },
    HandlerFailed {
        kind: String,
        reason: String,
    },
}

impl DispatchOutcome {
    pub fn kind(&self) -> &str {
        match self {
            DispatchOutcome::Handled { kind, .. }
            | DispatchOutcome::Unhandled { kind }
            | DispatchOutcome::HandlerFailed { kind, .. } => kind,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::Handled { .. } => "handled",
            DispatchOutcome::Unhandled { .. } => "unhandled",
            DispatchOutcome::HandlerFailed { .. } => "handler_failed",
        }
    }
}

/// Exact-match mapping from event-kind tag to handler, populated at startup.
#[derive(Clone, Default)]
pub struct EventRouter {
    handlers: BTreeMap<String, SharedHandler>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with the succeeded/failed payment intent handlers registered for every tag
    /// the gateway uses for them.
    pub fn with_payment_handlers(display_offset: UtcOffset) -> Self {
        let mut router = Self::new();
        let succeeded: SharedHandler = Arc::new(SucceededHandler::new(display_offset));
        let failed: SharedHandler = Arc::new(FailedHandler);
        for kind in KnownKind::ALL {
            let handler = match kind {
                KnownKind::PaymentIntentSucceeded => &succeeded,
                KnownKind::PaymentIntentFailed => &failed,
            };
            for tag in kind.tags() {
                router.handlers.insert((*tag).to_string(), handler.clone());
            }
        }
        router
    }

    /// Registers `handler` for `kind`, replacing any previous registration.
    pub fn register(&mut self, kind: impl Into<String>, handler: impl EventHandler + 'static) {
        self.handlers.insert(kind.into(), Arc::new(handler));
    }

    pub fn with_handler(mut self, kind: impl Into<String>, handler: impl EventHandler + 'static) -> Self {
        self.register(kind, handler);
        self
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn dispatch(&self, event: &VerifiedEvent) -> DispatchOutcome {
        let kind = event.kind();
        let outcome = match self.handlers.get(kind) {
            None => {
                tracing::warn!(
                    event_kind = %kind,
                    event_id = event.id(),
                    "unhandled event kind"
                );
                DispatchOutcome::Unhandled {
                    kind: kind.to_string(),
                }
            }
            Some(handler) => {
                match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event.body()))) {
                    Ok(Ok(observation)) => DispatchOutcome::Handled {
                        kind: kind.to_string(),
                        observation,
                    },
                    Ok(Err(err)) => {
                        tracing::warn!(
                            event_kind = %kind,
                            event_id = event.id(),
                            error = %err,
                            "event handler failed; acknowledging"
                        );
                        DispatchOutcome::HandlerFailed {
                            kind: kind.to_string(),
                            reason: err.to_string(),
                        }
                    }
                    Err(payload) => {
                        let reason = panic_reason(payload.as_ref());
                        tracing::warn!(
                            event_kind = %kind,
                            event_id = event.id(),
                            error = %reason,
                            "event handler panicked; acknowledging"
                        );
                        DispatchOutcome::HandlerFailed {
                            kind: kind.to_string(),
                            reason,
                        }
                    }
                }
            }
        };

        // Unregistered tags come from the sender; keep them out of metric labels.
        let kind_label = match &outcome {
            DispatchOutcome::Unhandled { .. } => "other".to_string(),
            other => other.kind().to_string(),
        };
        metrics::counter!(EVENTS_COUNTER, "kind" => kind_label, "outcome" => outcome.label())
            .increment(1);
        outcome
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("handler panicked: {message}")
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use payhook_core::{FieldExtractionError, PaymentOutcome};
    use security::{EventDecoder, SecretValue, SignatureVerifier, signature_header};
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SECRET: &str = "whsec_router";
    const NOW: i64 = 1_700_000_000;

    fn event(payload: Value) -> VerifiedEvent {
        let bytes = serde_json::to_vec(&payload).unwrap();
        let header = signature_header(&bytes, SECRET, NOW).unwrap();
        let verifier = SignatureVerifier::new(SecretValue::new(SECRET), 300);
        let verified = verifier.verify_payload_at(&bytes, &header, NOW).unwrap();
        EventDecoder::decode(verified).unwrap()
    }

    #[test]
    fn payment_handlers_cover_all_known_tags() {
        let router = EventRouter::with_payment_handlers(UtcOffset::UTC);
        let kinds: Vec<&str> = router.kinds().collect();
        assert_eq!(
            kinds,
            vec![
                "payment_intent.failed",
                "payment_intent.payment_failed",
                "payment_intent.succeeded"
            ]
        );
    }

    #[test]
    fn dispatches_by_exact_kind() {
        let router = EventRouter::with_payment_handlers(UtcOffset::UTC);
        let outcome = router.dispatch(&event(json!({
            "type": "payment_intent.succeeded",
            "data": {"object": {"id": "pi_1", "amount": 1000, "currency": "eur"}}
        })));
        match outcome {
            DispatchOutcome::Handled { kind, observation } => {
                assert_eq!(kind, "payment_intent.succeeded");
                assert_eq!(observation.payment_id(), "pi_1");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    #[tracing_test::traced_test]
    fn unknown_kinds_are_observed_not_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let router = EventRouter::new().with_handler("payment_intent.succeeded", move |_: &Value| -> crate::handlers::HandlerResult {
            seen.fetch_add(1, Ordering::SeqCst);
            Err(FieldExtractionError::MissingRequiredField { field: "id" })
        });

        let outcome = router.dispatch(&event(json!({
            "id": "evt_9",
            "type": "charge.dispute.created",
            "data": {"object": {"id": "dp_1"}}
        })));
        assert_eq!(
            outcome,
            DispatchOutcome::Unhandled {
                kind: "charge.dispute.created".into()
            }
        );
        assert_eq!(outcome.label(), "unhandled");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(logs_contain("unhandled event kind"));
        assert!(logs_contain("charge.dispute.created"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn handler_errors_are_contained() {
        let router = EventRouter::with_payment_handlers(UtcOffset::UTC);
        let outcome = router.dispatch(&event(json!({
            "type": "payment_intent.succeeded",
            "data": {"object": {"id": "pi_1"}}
        })));
        assert_eq!(
            outcome,
            DispatchOutcome::HandlerFailed {
                kind: "payment_intent.succeeded".into(),
                reason: "required field `amount` is missing".into(),
            }
        );
        assert!(logs_contain("event handler failed; acknowledging"));
    }

    #[test]
    fn handler_panics_are_contained() {
        let router = EventRouter::new().with_handler("boom", |_: &Value| -> crate::handlers::HandlerResult {
            panic!("exploded")
        });
        let outcome = router.dispatch(&event(json!({"type": "boom", "data": {"object": {}}})));
        assert_eq!(
            outcome,
            DispatchOutcome::HandlerFailed {
                kind: "boom".into(),
                reason: "handler panicked: exploded".into(),
            }
        );
    }

    #[test]
    fn registration_replaces_previous_handler() {
        let mut router = EventRouter::with_payment_handlers(UtcOffset::UTC);
        router.register("payment_intent.succeeded", |body: &Value| {
            PaymentOutcome::from_body(body)
                .map(|outcome| PaymentObservation::Succeeded(PaymentOutcome { amount: 0, ..outcome }))
        });
        let outcome = router.dispatch(&event(json!({
            "type": "payment_intent.succeeded",
            "data": {"object": {"id": "pi_1", "amount": 1000}}
        })));
        match outcome {
            DispatchOutcome::Handled {
                observation: PaymentObservation::Succeeded(outcome),
                ..
            } => assert_eq!(outcome.amount, 0),
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
