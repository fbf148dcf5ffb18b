use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which path performed the most recent write to a subscription record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_mutation_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MutationSource {
    Verify,
    Webhook,
    Sweeper,
    Cancel,
}

impl MutationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationSource::Verify => "verify",
            MutationSource::Webhook => "webhook",
            MutationSource::Sweeper => "sweeper",
            MutationSource::Cancel => "cancel",
        }
    }
}

/// Per-user paid-access state, correlated to the payment processor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub user_id: Uuid,
    pub is_subscribed: bool,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub processor_customer_id: Option<String>,
    pub processor_subscription_code: Option<String>,
    pub last_mutation_source: Option<MutationSource>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRecord {
    /// A fresh record for a newly created user: no access, no correlation ids.
    pub fn inactive(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            is_subscribed: false,
            subscription_end_date: None,
            processor_customer_id: None,
            processor_subscription_code: None,
            last_mutation_source: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Access is granted only while subscribed and the end date (if any) is
    /// strictly in the future. A null end date means active until disabled.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.is_subscribed && self.subscription_end_date.is_none_or(|end| now < end)
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    /// Whether the sweeper should demote this record.
    pub fn is_lapsed_at(&self, now: DateTime<Utc>) -> bool {
        self.is_subscribed && self.subscription_end_date.is_some_and(|end| end < now)
    }
}
