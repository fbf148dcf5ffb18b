use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_processor::{
        CheckoutRequest, CheckoutSession, PaymentProcessor, TransactionVerification,
    },
    domain::entities::processor_event::PaystackEventData,
    infra::http_client::build_client,
};

#[derive(Clone)]
pub struct PaystackClient {
    client: Client,
    base_url: Url,
    secret_key: Option<SecretString>,
}

impl PaystackClient {
    pub fn new(base_url: Url, secret_key: Option<SecretString>) -> Self {
        Self {
            client: build_client(),
            base_url,
            secret_key,
        }
    }

    fn auth_header(&self) -> AppResult<String> {
        let key = self.secret_key.as_ref().ok_or_else(|| {
            AppError::Configuration("Paystack secret key is not configured".into())
        })?;
        Ok(format!("Bearer {}", key.expose_secret()))
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::Internal(format!("Invalid Paystack URL for {}: {}", path, e)))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> AppResult<(StatusCode, String)> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "Paystack request failed");
            AppError::Upstream(format!("Paystack request failed: {}", e))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to read Paystack response: {}", e)))?;

        Ok((status, body))
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Serialize)]
struct InitializeBody<'a> {
    email: &'a str,
    /// Paystack expects the amount in the smallest currency unit, as a string.
    amount: String,
    plan: &'a str,
    metadata: InitializeMetadata,
}

#[derive(Serialize)]
struct InitializeMetadata {
    #[serde(rename = "userId")]
    user_id: String,
}

#[derive(Serialize)]
struct DisableBody<'a> {
    code: &'a str,
    token: &'a str,
}

/// Every Paystack reply is wrapped as `{status, message, data}`.
#[derive(Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: String,
    reference: String,
}

#[derive(Deserialize)]
struct VerifyData {
    #[serde(default)]
    status: String,
    #[serde(flatten)]
    details: PaystackEventData,
}

/// Checks transport status and the envelope's own `status` flag. `data` may
/// legitimately be null (subscription disable).
fn check_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> AppResult<Option<T>> {
    if !status.is_success() {
        tracing::error!(status = %status, body = %body, "Paystack API error");
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| body.to_string());
        return Err(AppError::Upstream(format!(
            "Paystack API error: {} - {}",
            status, message
        )));
    }

    let envelope: Envelope<T> = serde_json::from_str(body).map_err(|e| {
        tracing::error!(body = %body, error = %e, "Failed to parse Paystack response");
        AppError::Upstream(format!("Failed to parse Paystack response: {}", e))
    })?;

    if !envelope.status {
        let message = envelope.message.unwrap_or_default();
        tracing::error!(%message, "Paystack reported failure");
        return Err(AppError::Upstream(format!("Paystack error: {}", message)));
    }

    Ok(envelope.data)
}

fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> AppResult<T> {
    check_envelope(status, body)?
        .ok_or_else(|| AppError::Upstream("Paystack response missing data".into()))
}

// ============================================================================
// Port Implementation
// ============================================================================

#[async_trait]
impl PaymentProcessor for PaystackClient {
    async fn initialize_transaction(
        &self,
        request: &CheckoutRequest,
    ) -> AppResult<CheckoutSession> {
        let auth = self.auth_header()?;
        let body = InitializeBody {
            email: &request.email,
            amount: request.amount_minor.to_string(),
            plan: &request.plan_code,
            metadata: InitializeMetadata {
                user_id: request.user_id.to_string(),
            },
        };

        let (status, reply) = self
            .send(
                self.client
                    .post(self.endpoint("/transaction/initialize")?)
                    .header("Authorization", auth)
                    .json(&body),
            )
            .await?;
        let data: InitializeData = decode_envelope(status, &reply)?;

        Ok(CheckoutSession {
            redirect_url: data.authorization_url,
            access_code: data.access_code,
            reference: data.reference,
        })
    }

    async fn verify_transaction(&self, reference: &str) -> AppResult<TransactionVerification> {
        let auth = self.auth_header()?;
        let mut url = self.endpoint("/transaction/verify/")?;
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("Paystack base URL cannot be a base".into()))?
            .pop_if_empty()
            .push(reference);

        let (status, reply) = self
            .send(self.client.get(url).header("Authorization", auth))
            .await?;
        let data: VerifyData = decode_envelope(status, &reply)?;

        Ok(TransactionVerification {
            status: data.status,
            user_id: data.details.user_id(),
            customer_id: data.details.customer_id(),
            authorization_code: data.details.authorization_code(),
        })
    }

    async fn disable_subscription(&self, subscription_code: &str, token: &str) -> AppResult<()> {
        let auth = self.auth_header()?;
        let (status, reply) = self
            .send(
                self.client
                    .post(self.endpoint("/subscription/disable")?)
                    .header("Authorization", auth)
                    .json(&DisableBody {
                        code: subscription_code,
                        token,
                    }),
            )
            .await?;
        check_envelope::<serde_json::Value>(status, &reply)?;
        Ok(())
    }
}
