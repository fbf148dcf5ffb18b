//! Test app state builder for HTTP-level testing.
//!
//! `TestAppStateBuilder` assembles an `AppState` backed by the in-memory
//! subscription repo and the mock processor.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use time::Duration;
use url::Url;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    application::jwt,
    domain::entities::subscription_record::SubscriptionRecord,
    infra::config::AppConfig,
    test_utils::{
        InMemorySubscriptionRepo, MockPaymentProcessor, TEST_WEBHOOK_SECRET, test_settings,
    },
    use_cases::subscription::{BillingSettings, SubscriptionUseCases},
};

pub const TEST_JWT_SECRET: &str = "test_jwt_secret";

/// Signed access token for `user_id`, valid for an hour.
pub fn test_token(user_id: Uuid) -> String {
    jwt::issue(
        user_id,
        "user@example.com",
        &SecretString::new(TEST_JWT_SECRET.into()),
        Duration::hours(1),
    )
    .unwrap()
}

/// # Example
///
/// ```ignore
/// let (app_state, repo, processor) = TestAppStateBuilder::new()
///     .with_record(create_test_record(user_id, |r| r.is_subscribed = true))
///     .build_with_mocks();
/// ```
pub struct TestAppStateBuilder {
    records: Vec<SubscriptionRecord>,
    settings: BillingSettings,
    processor: Option<Arc<MockPaymentProcessor>>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            records: vec![],
            settings: test_settings(),
            processor: None,
        }
    }

    pub fn with_record(mut self, record: SubscriptionRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Adjust billing settings (plan code, webhook secret, cancel policy).
    pub fn with_settings(mut self, overrides: impl FnOnce(&mut BillingSettings)) -> Self {
        overrides(&mut self.settings);
        self
    }

    pub fn with_processor(mut self, processor: MockPaymentProcessor) -> Self {
        self.processor = Some(Arc::new(processor));
        self
    }

    pub fn build(self) -> AppState {
        self.build_with_mocks().0
    }

    /// Returns the repo and processor alongside the state for assertions.
    pub fn build_with_mocks(
        self,
    ) -> (
        AppState,
        Arc<InMemorySubscriptionRepo>,
        Arc<MockPaymentProcessor>,
    ) {
        let repo = Arc::new(InMemorySubscriptionRepo::with_records(self.records));
        let processor = self
            .processor
            .unwrap_or_else(|| Arc::new(MockPaymentProcessor::new()));

        let config = AppConfig {
            jwt_secret: SecretString::new(TEST_JWT_SECRET.into()),
            cors_origin: HeaderValue::from_static("http://localhost:3001"),
            bind_addr: "127.0.0.1:3000".parse::<SocketAddr>().unwrap(),
            database_url: String::new(),
            paystack_secret_key: Some(SecretString::new(TEST_WEBHOOK_SECRET.into())),
            paystack_public_key: None,
            paystack_plan_code: self.settings.plan_code.clone(),
            paystack_webhook_secret: self.settings.webhook_secret.clone(),
            paystack_base_url: Url::parse("https://api.paystack.test").unwrap(),
            subscription_amount_kobo: self.settings.amount_minor,
            cancel_fail_open: self.settings.cancel_fail_open,
        };

        let use_cases = SubscriptionUseCases::new(repo.clone(), processor.clone(), self.settings);

        let app_state = AppState {
            config: Arc::new(config),
            subscription_use_cases: Arc::new(use_cases),
        };

        (app_state, repo, processor)
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
