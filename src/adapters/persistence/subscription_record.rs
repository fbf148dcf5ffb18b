use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::subscription_record::{MutationSource, SubscriptionRecord},
    use_cases::subscription::{GrantAccessInput, SubscriptionRepo},
};

fn row_to_record(row: &sqlx::postgres::PgRow) -> SubscriptionRecord {
    SubscriptionRecord {
        user_id: row.get("user_id"),
        is_subscribed: row.get("is_subscribed"),
        subscription_end_date: row.get("subscription_end_date"),
        processor_customer_id: row.get("processor_customer_id"),
        processor_subscription_code: row.get("processor_subscription_code"),
        last_mutation_source: row.get::<Option<MutationSource>, _>("last_mutation_source"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    user_id, is_subscribed, subscription_end_date, processor_customer_id,
    processor_subscription_code, last_mutation_source, created_at, updated_at
"#;

/// Picks the single record a customer-scoped event applies to.
const LATEST_FOR_CUSTOMER: &str = r#"
    SELECT user_id FROM subscriptions
    WHERE processor_customer_id = $1
    ORDER BY updated_at DESC
    LIMIT 1
"#;

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    async fn create_inactive(&self, user_id: Uuid) -> AppResult<SubscriptionRecord> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO subscriptions (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = subscriptions.user_id
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_record(&row))
    }

    async fn get_by_user(&self, user_id: Uuid) -> AppResult<Option<SubscriptionRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1",
            SELECT_COLS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn grant_access(&self, input: &GrantAccessInput) -> AppResult<SubscriptionRecord> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO subscriptions (
                user_id, is_subscribed, subscription_end_date, processor_customer_id,
                processor_subscription_code, last_mutation_source
            )
            VALUES ($1, TRUE, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                is_subscribed = TRUE,
                subscription_end_date = EXCLUDED.subscription_end_date,
                processor_customer_id = COALESCE(
                    EXCLUDED.processor_customer_id,
                    subscriptions.processor_customer_id
                ),
                processor_subscription_code = COALESCE(
                    EXCLUDED.processor_subscription_code,
                    subscriptions.processor_subscription_code
                ),
                last_mutation_source = EXCLUDED.last_mutation_source,
                updated_at = now()
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(input.user_id)
        .bind(input.subscription_end_date)
        .bind(input.customer_id.as_deref())
        .bind(input.subscription_code.as_deref())
        .bind(input.source)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_record(&row))
    }

    async fn activate_by_customer_id(
        &self,
        customer_id: &str,
        subscription_end_date: DateTime<Utc>,
        subscription_code: Option<&str>,
        source: MutationSource,
    ) -> AppResult<Option<SubscriptionRecord>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE subscriptions SET
                is_subscribed = TRUE,
                subscription_end_date = $2,
                processor_subscription_code = COALESCE($3, processor_subscription_code),
                last_mutation_source = $4,
                updated_at = now()
            WHERE user_id = ({})
            RETURNING {}
            "#,
            LATEST_FOR_CUSTOMER, SELECT_COLS
        ))
        .bind(customer_id)
        .bind(subscription_end_date)
        .bind(subscription_code)
        .bind(source)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn revoke_by_customer_id(
        &self,
        customer_id: &str,
        source: MutationSource,
    ) -> AppResult<Option<SubscriptionRecord>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE subscriptions SET
                is_subscribed = FALSE,
                last_mutation_source = $2,
                updated_at = now()
            WHERE user_id = ({})
            RETURNING {}
            "#,
            LATEST_FOR_CUSTOMER, SELECT_COLS
        ))
        .bind(customer_id)
        .bind(source)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn revoke_by_user(
        &self,
        user_id: Uuid,
        source: MutationSource,
    ) -> AppResult<Option<SubscriptionRecord>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE subscriptions SET
                is_subscribed = FALSE,
                processor_subscription_code = NULL,
                last_mutation_source = $2,
                updated_at = now()
            WHERE user_id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(user_id)
        .bind(source)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn disable_by_subscription_code(
        &self,
        subscription_code: &str,
        source: MutationSource,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                is_subscribed = FALSE,
                processor_subscription_code = NULL,
                last_mutation_source = $2,
                updated_at = now()
            WHERE processor_subscription_code = $1
            "#,
        )
        .bind(subscription_code)
        .bind(source)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected())
    }

    async fn expire_lapsed(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                is_subscribed = FALSE,
                last_mutation_source = $2,
                updated_at = now()
            WHERE is_subscribed = TRUE AND subscription_end_date < $1
            "#,
        )
        .bind(now)
        .bind(MutationSource::Sweeper)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected())
    }
}
