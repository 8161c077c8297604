//! Verification of the gateway's `t=<secs>,v1=<hex>[,v1=<hex>...]` signature header.
//!
//! Each `v1` entry is a hex HMAC-SHA256 over `"{t}." ++ payload` keyed with the endpoint
//! secret. The payload must be the exact bytes received; any re-encoding breaks the MAC.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;

use crate::envelope::VerifiedPayload;
use crate::secret::SecretValue;

type HmacSha256 = Hmac<Sha256>;

/// Clock-skew tolerance used by the gateway's own client libraries.
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

const TIMESTAMP_KEY: &str = "t";
const SIGNATURE_SCHEME: &str = "v1";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("unable to parse signature header: {0}")]
    Malformed(&'static str),
    #[error("timestamp outside the tolerance zone ({skew}s > {tolerance}s)")]
    Expired { skew: u64, tolerance: u64 },
    #[error("no signatures found matching the expected signature for payload")]
    Mismatch,
    #[error("signing secret rejected by hmac")]
    InvalidKey,
}

/// Parsed form of the signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    /// Decoded `v1` candidates. Entries that are not valid hex are dropped since they can
    /// never match.
    pub signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, SignatureError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        let mut saw_scheme = false;

        for item in header.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            let (key, value) = item
                .split_once('=')
                .ok_or(SignatureError::Malformed("expected comma separated key=value pairs"))?;
            match key.trim() {
                TIMESTAMP_KEY => {
                    let parsed = value
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| SignatureError::Malformed("timestamp is not an integer"))?;
                    timestamp = Some(parsed);
                }
                SIGNATURE_SCHEME => {
                    saw_scheme = true;
                    if let Ok(bytes) = hex::decode(value.trim()) {
                        signatures.push(bytes);
                    }
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureError::Malformed("missing timestamp"))?;
        if !saw_scheme {
            return Err(SignatureError::Malformed("no v1 signatures found"));
        }
        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// Checks `header` against `payload` using the current wall clock.
pub fn verify(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: u64,
) -> Result<(), SignatureError> {
    verify_at(
        payload,
        header,
        secret,
        tolerance_secs,
        OffsetDateTime::now_utc().unix_timestamp(),
    )
}

/// Checks `header` against `payload` as if the current time were `now`.
///
/// Signatures are compared before the timestamp, so a stale header signed with the right
/// secret reports [`SignatureError::Expired`] while a forged one reports
/// [`SignatureError::Mismatch`].
pub fn verify_at(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: u64,
    now: i64,
) -> Result<(), SignatureError> {
    let parsed = SignatureHeader::parse(header)?;
    let expected = compute_signature(secret.as_bytes(), parsed.timestamp, payload)?;

    let matched = parsed
        .signatures
        .iter()
        .any(|candidate| bool::from(candidate.as_slice().ct_eq(expected.as_slice())));
    if !matched {
        return Err(SignatureError::Mismatch);
    }

    let skew = now.abs_diff(parsed.timestamp);
    if skew > tolerance_secs {
        return Err(SignatureError::Expired {
            skew,
            tolerance: tolerance_secs,
        });
    }
    Ok(())
}

/// Builds a header for `payload` signed at `timestamp`, in the format the gateway sends.
///
/// ```
/// use security::{signature_header, verify_at};
///
/// let payload = br#"{"type":"ping","data":{"object":{}}}"#;
/// let header = signature_header(payload, "whsec_test", 1_700_000_000).unwrap();
/// assert!(header.starts_with("t=1700000000,v1="));
/// assert!(verify_at(payload, &header, "whsec_test", 300, 1_700_000_010).is_ok());
/// ```
pub fn signature_header(
    payload: &[u8],
    secret: &str,
    timestamp: i64,
) -> Result<String, SignatureError> {
    let digest = compute_signature(secret.as_bytes(), timestamp, payload)?;
    Ok(format!(
        "{TIMESTAMP_KEY}={timestamp},{SIGNATURE_SCHEME}={}",
        hex::encode(digest)
    ))
}

fn compute_signature(
    secret: &[u8],
    timestamp: i64,
    payload: &[u8],
) -> Result<Vec<u8>, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Signature gate configured with the endpoint secret and clock-skew tolerance.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    secret: SecretValue,
    tolerance_secs: u64,
}

impl SignatureVerifier {
    pub fn new(secret: SecretValue, tolerance_secs: u64) -> Self {
        Self {
            secret,
            tolerance_secs,
        }
    }

    pub fn tolerance_secs(&self) -> u64 {
        self.tolerance_secs
    }

    pub fn verify_payload<'a>(
        &self,
        payload: &'a [u8],
        header: &str,
    ) -> Result<VerifiedPayload<'a>, SignatureError> {
        self.verify_payload_at(payload, header, OffsetDateTime::now_utc().unix_timestamp())
    }

    pub fn verify_payload_at<'a>(
        &self,
        payload: &'a [u8],
        header: &str,
        now: i64,
    ) -> Result<VerifiedPayload<'a>, SignatureError> {
        verify_at(payload, header, self.secret.expose(), self.tolerance_secs, now)?;
        Ok(VerifiedPayload::new(payload))
    }
}
