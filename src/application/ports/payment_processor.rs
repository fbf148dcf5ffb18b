use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::app_error::AppResult;

// ============================================================================
// Port Types - processor-agnostic
// ============================================================================

/// Parameters for opening a checkout session with the processor.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user_id: Uuid,
    pub email: String,
    pub amount_minor: i64,
    pub plan_code: String,
}

/// Handle returned to the client so it can complete payment off-site.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub redirect_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Outcome of a prior checkout as reported by the processor.
#[derive(Debug, Clone)]
pub struct TransactionVerification {
    /// Processor status string; only `"success"` grants access.
    pub status: String,
    pub user_id: Option<Uuid>,
    pub customer_id: Option<String>,
    pub authorization_code: Option<String>,
}

impl TransactionVerification {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Port Trait
// ============================================================================

/// Outbound calls to the payment processor. Every failure (transport,
/// timeout, non-success reply) surfaces as `AppError::Upstream`; nothing is
/// retried here.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn initialize_transaction(&self, request: &CheckoutRequest)
    -> AppResult<CheckoutSession>;

    async fn verify_transaction(&self, reference: &str) -> AppResult<TransactionVerification>;

    async fn disable_subscription(&self, subscription_code: &str, token: &str) -> AppResult<()>;
}
