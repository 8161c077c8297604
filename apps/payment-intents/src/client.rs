use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use security::SecretValue;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// What gets sent to the gateway for one checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentParams {
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub receipt_email: Option<String>,
}

impl PaymentIntentParams {
    fn form(&self) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("amount", self.amount.to_string()),
            ("currency", self.currency.clone()),
            ("description", self.description.clone()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];
        if let Some(email) = &self.receipt_email {
            form.push(("receipt_email", email.clone()));
        }
        form
    }
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedPaymentIntent {
    pub id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for CreatedPaymentIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreatedPaymentIntent")
            .field("id", &self.id)
            .field("client_secret", &"***")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected gateway response: {0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    error: GatewayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorDetail {
    message: Option<String>,
}

#[async_trait]
pub trait PaymentIntentClient: Send + Sync {
    async fn create(&self, params: PaymentIntentParams) -> Result<CreatedPaymentIntent, GatewayError>;
}

/// Calls the gateway's REST API with a form-encoded body.
pub struct HttpPaymentIntentClient {
    client: Client,
    api_base: String,
    api_key: SecretValue,
}

impl HttpPaymentIntentClient {
    pub fn new(client: Client, api_base: Option<String>, api_key: SecretValue) -> Self {
        let api_base = api_base.unwrap_or_else(|| DEFAULT_API_BASE.into());
        Self {
            client,
            api_base,
            api_key,
        }
    }

    fn url(&self) -> String {
        format!("{}/v1/payment_intents", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl PaymentIntentClient for HttpPaymentIntentClient {
    async fn create(&self, params: PaymentIntentParams) -> Result<CreatedPaymentIntent, GatewayError> {
        let res = self
            .client
            .post(self.url())
            .bearer_auth(self.api_key.expose())
            .timeout(REQUEST_TIMEOUT)
            .form(&params.form())
            .send()
            .await
            .map_err(GatewayError::Transport)?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GatewayErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.error.message)
                .unwrap_or_else(|| format!("gateway returned {status}"));
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        res.json().await.map_err(GatewayError::Decode)
    }
}

type Responder =
    Box<dyn Fn(&PaymentIntentParams) -> Result<CreatedPaymentIntent, GatewayError> + Send + Sync>;

/// In-memory client used in tests; records every request it receives.
pub struct InMemoryPaymentIntentClient {
    responder: Responder,
    requests: Mutex<Vec<PaymentIntentParams>>,
}

impl InMemoryPaymentIntentClient {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&PaymentIntentParams) -> Result<CreatedPaymentIntent, GatewayError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub async fn requests(&self) -> Vec<PaymentIntentParams> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl PaymentIntentClient for InMemoryPaymentIntentClient {
    async fn create(&self, params: PaymentIntentParams) -> Result<CreatedPaymentIntent, GatewayError> {
        let result = (self.responder)(&params);
        self.requests.lock().await.push(params);
        result
    }
}
