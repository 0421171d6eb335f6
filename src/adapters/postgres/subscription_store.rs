//! PostgreSQL implementation of SubscriptionStore.
//!
//! `subscriptions` holds one row per provider subscription;
//! `subscription_wallets` links wallets to it with `ON DELETE CASCADE`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{SubscriptionId, Timestamp, WalletAddress};
use crate::domain::subscription::{NewSubscription, Subscription, SubscriptionStatus};
use crate::ports::{CancelOutcome, CreateResult, StoreError, SubscriptionStore};

/// PostgreSQL implementation of the SubscriptionStore port.
pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    stripe_customer_id: String,
    stripe_subscription_id: String,
    stripe_session_id: String,
    customer_email: Option<String>,
    status: String,
    current_period_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = StoreError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let status = SubscriptionStatus::parse(&row.status).ok_or_else(|| {
            StoreError::CorruptRow(format!("Invalid status value: {}", row.status))
        })?;

        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            stripe_session_id: row.stripe_session_id,
            customer_email: row.customer_email,
            status,
            current_period_end: row.current_period_end.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn db_error(context: &str, e: sqlx::Error) -> StoreError {
    StoreError::database(format!("{}: {}", context, e))
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn create_subscription_with_wallet(
        &self,
        subscription: NewSubscription,
    ) -> Result<CreateResult, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let new_id = SubscriptionId::new();
        let now = Utc::now();

        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO subscriptions (
                id, stripe_customer_id, stripe_subscription_id, stripe_session_id,
                customer_email, status, current_period_end, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            ON CONFLICT (stripe_subscription_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(new_id.as_uuid())
        .bind(&subscription.stripe_customer_id)
        .bind(&subscription.stripe_subscription_id)
        .bind(&subscription.stripe_session_id)
        .bind(&subscription.customer_email)
        .bind(subscription.status.as_str())
        .bind(subscription.current_period_end.map(|t| *t.as_datetime()))
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to insert subscription", e))?;

        let Some(id) = inserted else {
            let existing: Uuid = sqlx::query_scalar(
                "SELECT id FROM subscriptions WHERE stripe_subscription_id = $1",
            )
            .bind(&subscription.stripe_subscription_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to load existing subscription", e))?;

            tx.rollback()
                .await
                .map_err(|e| db_error("Failed to roll back transaction", e))?;

            return Ok(CreateResult::AlreadyExists(SubscriptionId::from_uuid(existing)));
        };

        sqlx::query(
            r#"
            INSERT INTO subscription_wallets (subscription_id, wallet_address, is_primary, created_at)
            VALUES ($1, $2, TRUE, $3)
            ON CONFLICT (subscription_id, wallet_address) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(subscription.wallet_address.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to insert wallet link", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))?;

        Ok(CreateResult::Inserted(SubscriptionId::from_uuid(id)))
    }

    async fn mark_cancelled(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<CancelOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'cancelled', updated_at = NOW()
            WHERE stripe_subscription_id = $1
            "#,
        )
        .bind(stripe_subscription_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to cancel subscription", e))?;

        if result.rows_affected() == 0 {
            return Ok(CancelOutcome::NotFound);
        }

        Ok(CancelOutcome::Cancelled)
    }

    async fn find_active_by_wallet(
        &self,
        wallet_address: &WalletAddress,
    ) -> Result<Option<Subscription>, StoreError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT s.id, s.stripe_customer_id, s.stripe_subscription_id, s.stripe_session_id,
                   s.customer_email, s.status, s.current_period_end, s.created_at, s.updated_at
            FROM subscriptions s
            JOIN subscription_wallets w ON w.subscription_id = s.id
            WHERE w.wallet_address = $1 AND s.status = 'active'
            ORDER BY s.created_at DESC
            LIMIT 1
            "#,
        )
        .bind(wallet_address.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find subscription by wallet", e))?;

        row.map(Subscription::try_from).transpose()
    }

}
