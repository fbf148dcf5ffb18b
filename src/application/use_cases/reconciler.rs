//! Applies payment facts to subscription records.
//!
//! Ordering policy is last-write-wins per field: events carry no sequence
//! numbers, so a very late stale event can flip state. Everything that writes
//! subscription state on behalf of the processor goes through `Reconciler`,
//! which is where a per-record `last_event_at` guard would be added.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    domain::entities::{
        processor_event::NormalizedEvent,
        subscription_record::{MutationSource, SubscriptionRecord},
    },
    use_cases::subscription::{GrantAccessInput, SubscriptionRepo},
};

/// Length of the access window granted by one successful charge.
pub const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;

#[derive(Clone)]
pub struct Reconciler {
    repo: Arc<dyn SubscriptionRepo>,
    period: Duration,
}

impl Reconciler {
    pub fn new(repo: Arc<dyn SubscriptionRepo>) -> Self {
        Self {
            repo,
            period: Duration::days(SUBSCRIPTION_PERIOD_DAYS),
        }
    }

    /// Grants a fresh window starting now. Re-applying the same fact yields a
    /// window measured from the second application, never a summed one.
    #[instrument(skip(self))]
    pub async fn apply_verified_payment(
        &self,
        user_id: Uuid,
        customer_id: Option<String>,
        authorization_code: Option<String>,
        source: MutationSource,
    ) -> AppResult<SubscriptionRecord> {
        let input = GrantAccessInput {
            user_id,
            subscription_end_date: Utc::now() + self.period,
            customer_id,
            subscription_code: authorization_code,
            source,
        };

        let record = self.repo.grant_access(&input).await?;
        info!(
            %user_id,
            end_date = ?record.subscription_end_date,
            source = source.as_str(),
            "Subscription activated"
        );
        Ok(record)
    }

    #[instrument(skip(self, event), fields(event = event.kind()))]
    pub async fn apply_event(&self, event: NormalizedEvent) -> AppResult<()> {
        match event {
            NormalizedEvent::ChargeSucceeded {
                user_id,
                customer_id,
                authorization_code,
            } => {
                let Some(user_id) = user_id else {
                    warn!("charge.success without a userId in metadata; ignoring");
                    return Ok(());
                };
                self.apply_verified_payment(
                    user_id,
                    customer_id,
                    authorization_code,
                    MutationSource::Webhook,
                )
                .await?;
            }
            NormalizedEvent::SubscriptionCreated {
                customer_code,
                next_payment_date,
                authorization_code,
                subscription_code,
            } => {
                let end = next_payment_date.unwrap_or_else(Utc::now);
                let code = subscription_code.or(authorization_code);
                match self
                    .repo
                    .activate_by_customer_id(
                        &customer_code,
                        end,
                        code.as_deref(),
                        MutationSource::Webhook,
                    )
                    .await?
                {
                    Some(record) => info!(
                        user_id = %record.user_id,
                        %customer_code,
                        "Subscription created"
                    ),
                    None => warn!(%customer_code, "No subscription record for customer; ignoring"),
                }
            }
            NormalizedEvent::SubscriptionDisabled { subscription_code } => {
                let affected = self
                    .repo
                    .disable_by_subscription_code(&subscription_code, MutationSource::Webhook)
                    .await?;
                info!(%subscription_code, affected, "Subscription disabled");
            }
            NormalizedEvent::PaymentFailed { customer_code } => {
                match self
                    .repo
                    .revoke_by_customer_id(&customer_code, MutationSource::Webhook)
                    .await?
                {
                    Some(record) => info!(
                        user_id = %record.user_id,
                        %customer_code,
                        "Subscription deactivated due to payment failure"
                    ),
                    None => warn!(%customer_code, "No subscription record for customer; ignoring"),
                }
            }
        }

        Ok(())
    }
}
