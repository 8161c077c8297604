//! Event-kind tags understood by the ingress.
//!
//! The gateway's taxonomy is open: any tag not listed here is still a valid event and is
//! acknowledged without being handled.

pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_INTENT_FAILED: &str = "payment_intent.failed";
/// Name the gateway emits for failed authorizations.
pub const PAYMENT_INTENT_PAYMENT_FAILED: &str = "payment_intent.payment_failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownKind {
    PaymentIntentSucceeded,
    PaymentIntentFailed,
}

impl KnownKind {
    pub const ALL: [KnownKind; 2] = [KnownKind::PaymentIntentSucceeded, KnownKind::PaymentIntentFailed];

    /// Exact-match lookup of a wire tag.
    ///
    /// ```
    /// use payhook_core::KnownKind;
    ///
    /// assert_eq!(
    ///     KnownKind::from_tag("payment_intent.payment_failed"),
    ///     Some(KnownKind::PaymentIntentFailed)
    /// );
    /// assert_eq!(KnownKind::from_tag("charge.dispute.created"), None);
    /// ```
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tags().iter().any(|candidate| *candidate == tag))
    }

    pub fn tags(self) -> &'static [&'static str] {
        match self {
            KnownKind::PaymentIntentSucceeded => &[PAYMENT_INTENT_SUCCEEDED],
            KnownKind::PaymentIntentFailed => &[PAYMENT_INTENT_FAILED, PAYMENT_INTENT_PAYMENT_FAILED],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_matched_exactly() {
        assert_eq!(
            KnownKind::from_tag("payment_intent.succeeded"),
            Some(KnownKind::PaymentIntentSucceeded)
        );
        assert_eq!(
            KnownKind::from_tag("payment_intent.failed"),
            Some(KnownKind::PaymentIntentFailed)
        );
        assert_eq!(KnownKind::from_tag("PAYMENT_INTENT.SUCCEEDED"), None);
        assert_eq!(KnownKind::from_tag("payment_intent.succeeded "), None);
    }

    #[test]
    fn every_tag_maps_back_to_its_kind() {
        for kind in KnownKind::ALL {
            for tag in kind.tags() {
                assert_eq!(KnownKind::from_tag(tag), Some(kind));
            }
        }
    }
}
