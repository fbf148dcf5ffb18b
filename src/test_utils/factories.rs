//! Test data factories. Use the closure parameter to override fields.

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use uuid::Uuid;

use crate::{
    domain::entities::subscription_record::SubscriptionRecord,
    use_cases::subscription::BillingSettings,
};

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

/// A fixed point well in the past so mutations always move `updated_at`.
pub fn test_datetime() -> DateTime<Utc> {
    Utc::now() - Duration::days(1)
}

/// Create an inactive subscription record for `user_id`.
pub fn create_test_record(
    user_id: Uuid,
    overrides: impl FnOnce(&mut SubscriptionRecord),
) -> SubscriptionRecord {
    let mut record = SubscriptionRecord::inactive(user_id, test_datetime());
    overrides(&mut record);
    record
}

pub fn test_settings() -> BillingSettings {
    BillingSettings {
        plan_code: Some("PLN_test".to_string()),
        amount_minor: 500_000,
        webhook_secret: Some(SecretString::new(TEST_WEBHOOK_SECRET.into())),
        cancel_fail_open: false,
    }
}
