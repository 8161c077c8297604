//! Payment gateway webhook ingress.
//!
//! Exposes `POST /webhook`, which checks the gateway signature over the raw body, decodes
//! the event envelope, and routes the event to the handler registered for its kind.
pub mod config;
pub mod endpoint;
pub mod handlers;
pub mod http;
pub mod reqid;
pub mod router;

pub use config::WebhookConfig;
pub use endpoint::{ACK_BODY, DECODE_ERROR_BODY, WebhookEndpoint, WebhookReply};
pub use handlers::{EventHandler, FailedHandler, HandlerResult, SucceededHandler};
pub use http::{GATEWAY_SIGNATURE_HEADER, SIGNATURE_HEADER, WEBHOOK_PATH, build_router};
pub use reqid::{REQUEST_ID_HEADER, RequestId, with_request_id};
pub use router::{DispatchOutcome, EventRouter, SharedHandler};
