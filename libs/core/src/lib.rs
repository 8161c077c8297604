//! Payhook core contracts and value types.
//!
//! This crate holds the event-kind taxonomy shared by the webhook ingress, the typed views
//! decoded from an event body (`PaymentOutcome`, `PaymentFailure`), and small helpers for
//! rendering gateway timestamps.
pub mod kinds;
pub mod payment;
pub mod unix_time;

pub use kinds::*;
pub use payment::*;
pub use unix_time::*;
