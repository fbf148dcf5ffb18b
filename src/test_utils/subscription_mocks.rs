//! In-memory stand-ins for the subscription store and the payment processor.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_processor::{
        CheckoutRequest, CheckoutSession, PaymentProcessor, TransactionVerification,
    },
    domain::entities::subscription_record::{MutationSource, SubscriptionRecord},
    use_cases::subscription::{GrantAccessInput, SubscriptionRepo},
};

// ============================================================================
// InMemorySubscriptionRepo
// ============================================================================

#[derive(Default)]
pub struct InMemorySubscriptionRepo {
    pub records: Mutex<HashMap<Uuid, SubscriptionRecord>>,
    fail_writes: AtomicBool,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<SubscriptionRecord>) -> Self {
        let map = records.into_iter().map(|r| (r.user_id, r)).collect();
        Self {
            records: Mutex::new(map),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn get(&self, user_id: Uuid) -> Option<SubscriptionRecord> {
        self.records.lock().unwrap().get(&user_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Makes every subsequent write return a database error.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn check_writable(&self) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database("simulated write failure".into()));
        }
        Ok(())
    }

    fn latest_for_customer(
        records: &HashMap<Uuid, SubscriptionRecord>,
        customer_id: &str,
    ) -> Option<Uuid> {
        records
            .values()
            .filter(|r| r.processor_customer_id.as_deref() == Some(customer_id))
            .max_by_key(|r| r.updated_at)
            .map(|r| r.user_id)
    }
}

#[async_trait]
impl SubscriptionRepo for InMemorySubscriptionRepo {
    async fn create_inactive(&self, user_id: Uuid) -> AppResult<SubscriptionRecord> {
        self.check_writable()?;
        let mut records = self.records.lock().unwrap();
        Ok(records
            .entry(user_id)
            .or_insert_with(|| SubscriptionRecord::inactive(user_id, Utc::now()))
            .clone())
    }

    async fn get_by_user(&self, user_id: Uuid) -> AppResult<Option<SubscriptionRecord>> {
        Ok(self.get(user_id))
    }

    async fn grant_access(&self, input: &GrantAccessInput) -> AppResult<SubscriptionRecord> {
        self.check_writable()?;
        let mut records = self.records.lock().unwrap();
        let now = Utc::now();
        let record = records
            .entry(input.user_id)
            .or_insert_with(|| SubscriptionRecord::inactive(input.user_id, now));

        record.is_subscribed = true;
        record.subscription_end_date = Some(input.subscription_end_date);
        if let Some(customer_id) = &input.customer_id {
            record.processor_customer_id = Some(customer_id.clone());
        }
        if let Some(code) = &input.subscription_code {
            record.processor_subscription_code = Some(code.clone());
        }
        record.last_mutation_source = Some(input.source);
        record.updated_at = now;
        Ok(record.clone())
    }

    async fn activate_by_customer_id(
        &self,
        customer_id: &str,
        subscription_end_date: DateTime<Utc>,
        subscription_code: Option<&str>,
        source: MutationSource,
    ) -> AppResult<Option<SubscriptionRecord>> {
        self.check_writable()?;
        let mut records = self.records.lock().unwrap();
        let Some(user_id) = Self::latest_for_customer(&records, customer_id) else {
            return Ok(None);
        };
        let record = records.get_mut(&user_id).map(|record| {
            record.is_subscribed = true;
            record.subscription_end_date = Some(subscription_end_date);
            if let Some(code) = subscription_code {
                record.processor_subscription_code = Some(code.to_string());
            }
            record.last_mutation_source = Some(source);
            record.updated_at = Utc::now();
            record.clone()
        });
        Ok(record)
    }

    async fn revoke_by_customer_id(
        &self,
        customer_id: &str,
        source: MutationSource,
    ) -> AppResult<Option<SubscriptionRecord>> {
        self.check_writable()?;
        let mut records = self.records.lock().unwrap();
        let Some(user_id) = Self::latest_for_customer(&records, customer_id) else {
            return Ok(None);
        };
        let record = records.get_mut(&user_id).map(|record| {
            record.is_subscribed = false;
            record.last_mutation_source = Some(source);
            record.updated_at = Utc::now();
            record.clone()
        });
        Ok(record)
    }

    async fn revoke_by_user(
        &self,
        user_id: Uuid,
        source: MutationSource,
    ) -> AppResult<Option<SubscriptionRecord>> {
        self.check_writable()?;
        let mut records = self.records.lock().unwrap();
        let record = records.get_mut(&user_id).map(|record| {
            record.is_subscribed = false;
            record.processor_subscription_code = None;
            record.last_mutation_source = Some(source);
            record.updated_at = Utc::now();
            record.clone()
        });
        Ok(record)
    }

    async fn disable_by_subscription_code(
        &self,
        subscription_code: &str,
        source: MutationSource,
    ) -> AppResult<u64> {
        self.check_writable()?;
        let mut records = self.records.lock().unwrap();
        let mut affected = 0;
        for record in records
            .values_mut()
            .filter(|r| r.processor_subscription_code.as_deref() == Some(subscription_code))
        {
            record.is_subscribed = false;
            record.processor_subscription_code = None;
            record.last_mutation_source = Some(source);
            record.updated_at = Utc::now();
            affected += 1;
        }
        Ok(affected)
    }

    async fn expire_lapsed(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.check_writable()?;
        let mut records = self.records.lock().unwrap();
        let mut affected = 0;
        for record in records.values_mut().filter(|r| r.is_lapsed_at(now)) {
            record.is_subscribed = false;
            record.last_mutation_source = Some(MutationSource::Sweeper);
            record.updated_at = Utc::now();
            affected += 1;
        }
        Ok(affected)
    }
}

// ============================================================================
// MockPaymentProcessor
// ============================================================================

/// Scriptable processor: sessions opened through `initialize_transaction` can
/// be completed with any status via `complete`, then verified.
#[derive(Default)]
pub struct MockPaymentProcessor {
    checkouts: Mutex<Vec<CheckoutRequest>>,
    /// reference -> (tagged user, status)
    transactions: Mutex<HashMap<String, (Option<Uuid>, String)>>,
    disabled: Mutex<Vec<String>>,
    initialize_calls: AtomicUsize,
    fail_next_initialize: AtomicBool,
    fail_next_disable: AtomicBool,
}

impl MockPaymentProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    pub fn last_checkout(&self) -> Option<CheckoutRequest> {
        self.checkouts.lock().unwrap().last().cloned()
    }

    /// Records the processor-side outcome of a previously opened session.
    pub fn complete(&self, reference: &str, status: &str) {
        if let Some(entry) = self.transactions.lock().unwrap().get_mut(reference) {
            entry.1 = status.to_string();
        }
    }

    /// Registers a transaction that was never opened through this service.
    pub fn with_transaction(self, reference: &str, user_id: Option<Uuid>, status: &str) -> Self {
        self.transactions
            .lock()
            .unwrap()
            .insert(reference.to_string(), (user_id, status.to_string()));
        self
    }

    pub fn disabled_codes(&self) -> Vec<String> {
        self.disabled.lock().unwrap().clone()
    }

    pub fn fail_next_initialize(&self) {
        self.fail_next_initialize.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_disable(&self) {
        self.fail_next_disable.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentProcessor for MockPaymentProcessor {
    async fn initialize_transaction(
        &self,
        request: &CheckoutRequest,
    ) -> AppResult<CheckoutSession> {
        let n = self.initialize_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_next_initialize.swap(false, Ordering::SeqCst) {
            return Err(AppError::Upstream("simulated processor outage".into()));
        }

        let reference = format!("ref_mock_{}", n);
        self.checkouts.lock().unwrap().push(request.clone());
        self.transactions
            .lock()
            .unwrap()
            .insert(reference.clone(), (Some(request.user_id), "pending".to_string()));

        Ok(CheckoutSession {
            redirect_url: format!("https://checkout.paystack.test/{}", reference),
            access_code: format!("access_{}", n),
            reference,
        })
    }

    async fn verify_transaction(&self, reference: &str) -> AppResult<TransactionVerification> {
        let transactions = self.transactions.lock().unwrap();
        let (user_id, status) = transactions
            .get(reference)
            .cloned()
            .ok_or_else(|| AppError::Upstream("Transaction reference not found".into()))?;

        Ok(TransactionVerification {
            status,
            user_id,
            customer_id: Some("CUS_mock".to_string()),
            authorization_code: Some("AUTH_mock".to_string()),
        })
    }

    async fn disable_subscription(&self, subscription_code: &str, _token: &str) -> AppResult<()> {
        if self.fail_next_disable.swap(false, Ordering::SeqCst) {
            return Err(AppError::Upstream("simulated processor outage".into()));
        }
        self.disabled
            .lock()
            .unwrap()
            .push(subscription_code.to_string());
        Ok(())
    }
}
