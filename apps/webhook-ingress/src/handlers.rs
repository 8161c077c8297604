//! Per-kind domain handlers.
//!
//! Handlers receive the opaque event body and decode only the fields they need. Errors are
//! returned to the router, which contains them; they never reach the HTTP response.

use payhook_core::{
    FieldExtractionError, PaymentFailure, PaymentObservation, PaymentOutcome, format_unix,
};
use serde_json::Value;
use time::UtcOffset;

pub type HandlerResult = Result<PaymentObservation, FieldExtractionError>;

pub trait EventHandler: Send + Sync {
    fn handle(&self, body: &Value) -> HandlerResult;
}

impl<F> EventHandler for F
where
    F: Fn(&Value) -> HandlerResult + Send + Sync,
{
    fn handle(&self, body: &Value) -> HandlerResult {
        self(body)
    }
}

/// Records a successful payment authorization.
#[derive(Debug, Clone, Copy)]
pub struct SucceededHandler {
    display_offset: UtcOffset,
}

impl SucceededHandler {
    pub fn new(display_offset: UtcOffset) -> Self {
        Self { display_offset }
    }
}

impl Default for SucceededHandler {
    fn default() -> Self {
        Self::new(UtcOffset::UTC)
    }
}

impl EventHandler for SucceededHandler {
    fn handle(&self, body: &Value) -> HandlerResult {
        let outcome = PaymentOutcome::from_body(body)?;
        let created = outcome
            .created
            .map(|secs| {
                format_unix(secs, self.display_offset).map_err(|_| {
                    FieldExtractionError::OutOfRange {
                        field: "created",
                        value: secs,
                    }
                })
            })
            .transpose()?;

        tracing::info!(
            payment_intent = %outcome.id,
            amount = outcome.amount,
            currency = outcome.currency.as_deref(),
            customer = outcome.customer.as_deref(),
            payment_method = outcome.payment_method.as_deref(),
            status = outcome.status.as_deref(),
            created = created.as_deref(),
            "payment intent succeeded"
        );
        Ok(PaymentObservation::Succeeded(outcome))
    }
}

/// Records a failed payment authorization.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailedHandler;

impl EventHandler for FailedHandler {
    fn handle(&self, body: &Value) -> HandlerResult {
        let failure = PaymentFailure::from_body(body)?;
        tracing::warn!(
            payment_intent = %failure.id,
            error = %failure.message,
            code = failure.code.as_deref(),
            "payment intent failed"
        );
        Ok(PaymentObservation::Failed(failure))
    }
}
