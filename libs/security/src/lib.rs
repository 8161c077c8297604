//! Trust boundary of the payhook webhook ingress.
//!
//! [`SignatureVerifier`] checks the gateway's signature header and is the only producer of
//! [`VerifiedPayload`]; [`EventDecoder`] only accepts a `VerifiedPayload`, so a
//! [`VerifiedEvent`] cannot exist without a successful signature check.
pub mod envelope;
pub mod secret;
pub mod signature;

pub use envelope::{DecodeError, EventDecoder, VerifiedEvent, VerifiedPayload};
pub use secret::SecretValue;
pub use signature::{
    DEFAULT_TOLERANCE_SECS, SignatureError, SignatureHeader, SignatureVerifier, signature_header,
    verify, verify_at,
};
