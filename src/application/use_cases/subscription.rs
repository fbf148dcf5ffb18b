use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_processor::{CheckoutRequest, CheckoutSession, PaymentProcessor},
    domain::entities::{
        processor_event::{Normalized, PaystackWebhook, normalize},
        subscription_record::{MutationSource, SubscriptionRecord},
    },
    infra::webhook_signature,
    use_cases::reconciler::Reconciler,
};

// ============================================================================
// Repository Trait
// ============================================================================

#[derive(Debug, Clone)]
pub struct GrantAccessInput {
    pub user_id: Uuid,
    pub subscription_end_date: DateTime<Utc>,
    /// Stored only when present; `None` keeps whatever is already recorded.
    pub customer_id: Option<String>,
    /// Stored only when present; `None` keeps whatever is already recorded.
    pub subscription_code: Option<String>,
    pub source: MutationSource,
}

/// Durable per-user subscription state. Every mutating method is a single
/// statement against the store.
#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    /// Inserts an inactive record; returns the existing one if already present.
    async fn create_inactive(&self, user_id: Uuid) -> AppResult<SubscriptionRecord>;

    async fn get_by_user(&self, user_id: Uuid) -> AppResult<Option<SubscriptionRecord>>;

    /// Upserts: sets subscribed, end date, and any supplied correlation ids.
    async fn grant_access(&self, input: &GrantAccessInput) -> AppResult<SubscriptionRecord>;

    /// Activates the most recently updated record with this customer id.
    async fn activate_by_customer_id(
        &self,
        customer_id: &str,
        subscription_end_date: DateTime<Utc>,
        subscription_code: Option<&str>,
        source: MutationSource,
    ) -> AppResult<Option<SubscriptionRecord>>;

    /// Deactivates the most recently updated record with this customer id,
    /// leaving correlation ids intact.
    async fn revoke_by_customer_id(
        &self,
        customer_id: &str,
        source: MutationSource,
    ) -> AppResult<Option<SubscriptionRecord>>;

    /// Deactivates the user's record and clears its subscription code.
    async fn revoke_by_user(
        &self,
        user_id: Uuid,
        source: MutationSource,
    ) -> AppResult<Option<SubscriptionRecord>>;

    /// Deactivates every record holding this subscription code and clears it.
    async fn disable_by_subscription_code(
        &self,
        subscription_code: &str,
        source: MutationSource,
    ) -> AppResult<u64>;

    /// Bulk demotion of subscribed records whose end date is before `now`.
    async fn expire_lapsed(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

// ============================================================================
// Settings & Result Types
// ============================================================================

/// Processor settings, loaded once at startup and never re-read.
#[derive(Clone)]
pub struct BillingSettings {
    pub plan_code: Option<String>,
    pub amount_minor: i64,
    pub webhook_secret: Option<SecretString>,
    /// When true, a failed upstream disable on cancel is logged and the local
    /// demotion still happens. When false, the failure is returned and local
    /// state is left untouched.
    pub cancel_fail_open: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusView {
    pub is_subscribed: bool,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl From<&SubscriptionRecord> for SubscriptionStatusView {
    fn from(record: &SubscriptionRecord) -> Self {
        Self {
            is_subscribed: record.is_subscribed,
            subscription_end_date: record.subscription_end_date,
            is_active: record.is_active(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub status: String,
    pub message: String,
    pub subscription_end_date: Option<DateTime<Utc>>,
}

/// What happened to an inbound webhook after its signature checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Applied,
    Ignored,
    Failed,
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct SubscriptionUseCases {
    repo: Arc<dyn SubscriptionRepo>,
    processor: Arc<dyn PaymentProcessor>,
    reconciler: Reconciler,
    settings: Arc<BillingSettings>,
}

impl SubscriptionUseCases {
    pub fn new(
        repo: Arc<dyn SubscriptionRepo>,
        processor: Arc<dyn PaymentProcessor>,
        settings: BillingSettings,
    ) -> Self {
        Self {
            reconciler: Reconciler::new(repo.clone()),
            repo,
            processor,
            settings: Arc::new(settings),
        }
    }

    /// Called by the user collaborator when an account is created.
    pub async fn enroll_user(&self, user_id: Uuid) -> AppResult<SubscriptionRecord> {
        self.repo.create_inactive(user_id).await
    }

    pub async fn is_subscription_active(&self, user_id: Uuid) -> AppResult<bool> {
        Ok(self
            .repo
            .get_by_user(user_id)
            .await?
            .is_some_and(|record| record.is_active()))
    }

    pub async fn status(&self, user_id: Uuid) -> AppResult<SubscriptionStatusView> {
        let record = self
            .repo
            .get_by_user(user_id)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(SubscriptionStatusView::from(&record))
    }

    #[instrument(skip(self, email))]
    pub async fn initialize_payment(
        &self,
        user_id: Uuid,
        email: &str,
    ) -> AppResult<CheckoutSession> {
        let plan_code = self.settings.plan_code.clone().ok_or_else(|| {
            AppError::Configuration("Subscription plan code is not configured".into())
        })?;

        if email.trim().is_empty() {
            return Err(AppError::InvalidInput("An email address is required".into()));
        }

        let session = self
            .processor
            .initialize_transaction(&CheckoutRequest {
                user_id,
                email: email.trim().to_string(),
                amount_minor: self.settings.amount_minor,
                plan_code,
            })
            .await?;

        info!(%user_id, reference = %session.reference, "Payment session initialized");
        Ok(session)
    }

    /// Queries the processor for a prior checkout and grants access on success.
    /// The payment is attributed to the user tagged in the session metadata; a
    /// transaction without that tag grants nothing.
    #[instrument(skip(self))]
    pub async fn verify_payment(
        &self,
        caller_id: Uuid,
        reference: &str,
    ) -> AppResult<VerificationResult> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(AppError::InvalidInput("A payment reference is required".into()));
        }

        let verification = self.processor.verify_transaction(reference).await?;

        if !verification.is_success() {
            warn!(
                reference,
                status = %verification.status,
                "Payment not successful; subscription unchanged"
            );
            return Err(AppError::PaymentVerificationFailed(format!(
                "Transaction status is '{}'",
                verification.status
            )));
        }

        let Some(user_id) = verification.user_id else {
            warn!(%caller_id, reference, "Verified payment carries no userId; ignoring");
            return Err(AppError::PaymentVerificationFailed(
                "Transaction is not attributable to a user".into(),
            ));
        };
        if user_id != caller_id {
            info!(%caller_id, %user_id, "Verified payment belongs to the user tagged at checkout");
        }

        let record = self
            .reconciler
            .apply_verified_payment(
                user_id,
                verification.customer_id,
                verification.authorization_code,
                MutationSource::Verify,
            )
            .await?;

        Ok(VerificationResult {
            status: verification.status,
            message: "Subscription activated successfully".to_string(),
            subscription_end_date: record.subscription_end_date,
        })
    }

    #[instrument(skip(self))]
    pub async fn cancel(&self, user_id: Uuid) -> AppResult<()> {
        let record = self
            .repo
            .get_by_user(user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if let Some(code) = record.processor_subscription_code.as_deref() {
            let token = record.processor_customer_id.as_deref().unwrap_or_default();
            if let Err(e) = self.processor.disable_subscription(code, token).await {
                if !self.settings.cancel_fail_open {
                    error!(%user_id, error = %e, "Processor refused to disable subscription");
                    return Err(e);
                }
                warn!(
                    %user_id,
                    error = %e,
                    "Processor disable failed; demoting locally anyway"
                );
            }
        }

        self.repo
            .revoke_by_user(user_id, MutationSource::Cancel)
            .await?
            .ok_or(AppError::NotFound)?;

        info!(%user_id, "Subscription cancelled");
        Ok(())
    }

    /// Verifies, parses and applies one webhook delivery.
    ///
    /// Returns `Err` only for rejections that must reach the processor as a
    /// 4xx (bad signature, missing secret, unparseable envelope). Failures
    /// while applying the event are logged and reported as `Failed`.
    #[instrument(skip_all)]
    pub async fn handle_webhook(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> AppResult<WebhookOutcome> {
        webhook_signature::verify_with_configured_secret(
            raw_body,
            signature,
            self.settings.webhook_secret.as_ref(),
        )?;

        let webhook: PaystackWebhook = serde_json::from_slice(raw_body)
            .map_err(|e| AppError::InvalidInput(format!("Invalid webhook payload: {}", e)))?;

        info!(event_type = %webhook.event, "Processing webhook event");

        let event = match normalize(&webhook.event, webhook.data.as_ref()) {
            Normalized::Event(event) => event,
            Normalized::Unattributable { event_type, reason } => {
                warn!(%event_type, reason, "Webhook event cannot be attributed; ignoring");
                return Ok(WebhookOutcome::Ignored);
            }
            Normalized::Unhandled { event_type } => {
                warn!(%event_type, "Unhandled webhook event");
                return Ok(WebhookOutcome::Ignored);
            }
        };

        let context = format!("{:?}", event);
        match self.reconciler.apply_event(event).await {
            Ok(()) => Ok(WebhookOutcome::Applied),
            Err(e) => {
                error!(
                    event_type = %webhook.event,
                    event = %context,
                    error = %e,
                    "Webhook processing failed; acknowledging to avoid retry storm"
                );
                Ok(WebhookOutcome::Failed)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn expire_lapsed_subscriptions(&self) -> AppResult<u64> {
        let affected = self.repo.expire_lapsed(Utc::now()).await?;
        info!(affected, "Marked lapsed subscriptions as expired");
        Ok(affected)
    }
}
