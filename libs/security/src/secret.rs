use std::fmt;

/// Secret configuration value (webhook signing secret, gateway API key).
///
/// `Debug` is redacted so the value never ends up in logs through a derived impl.
///
/// ```
/// use security::SecretValue;
///
/// let secret = SecretValue::new("whsec_123");
/// assert_eq!(format!("{secret:?}"), "SecretValue(***)");
/// assert_eq!(secret.expose(), "whsec_123");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(***)")
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecretValue {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
