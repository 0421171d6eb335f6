//! Subscription store port.
//!
//! Two related tables: subscriptions and their wallet links. Creation writes
//! both in one transaction so a reader never sees a subscription without its
//! primary wallet.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{SubscriptionId, WalletAddress};
use crate::domain::subscription::{NewSubscription, Subscription, SubscriptionError};

/// Result of inserting a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateResult {
    /// Rows were written in this call.
    Inserted(SubscriptionId),
    /// A subscription with the same provider ID already existed. Nothing was written.
    AlreadyExists(SubscriptionId),
}

impl CreateResult {
    pub fn id(&self) -> SubscriptionId {
        match self {
            CreateResult::Inserted(id) | CreateResult::AlreadyExists(id) => *id,
        }
    }
}

/// Result of a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// A row matched and now reads `cancelled`.
    Cancelled,
    /// No subscription with that provider ID. Not an error.
    NotFound,
}

/// Persistence failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    /// A stored row could not be mapped back into the domain.
    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

impl StoreError {
    pub fn database(message: impl Into<String>) -> Self {
        StoreError::Database(message.into())
    }
}

impl From<StoreError> for SubscriptionError {
    fn from(err: StoreError) -> Self {
        SubscriptionError::Persistence(err.to_string())
    }
}

/// Port for subscription persistence.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Inserts a subscription and its primary wallet link atomically.
    ///
    /// A provider subscription ID that is already stored returns
    /// `AlreadyExists` with the existing ID. On error nothing is written.
    async fn create_subscription_with_wallet(
        &self,
        subscription: NewSubscription,
    ) -> Result<CreateResult, StoreError>;

    /// Sets status to `cancelled` and refreshes `updated_at`.
    ///
    /// Idempotent. An unknown ID yields `CancelOutcome::NotFound`.
    async fn mark_cancelled(&self, stripe_subscription_id: &str)
        -> Result<CancelOutcome, StoreError>;

    /// Most recently created active-status subscription linked to the wallet.
    async fn find_active_by_wallet(
        &self,
        wallet_address: &WalletAddress,
    ) -> Result<Option<Subscription>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn SubscriptionStore) {}
    }

    #[test]
    fn create_result_exposes_id() {
        let id = SubscriptionId::new();
        assert_eq!(CreateResult::Inserted(id).id(), id);
        assert_eq!(CreateResult::AlreadyExists(id).id(), id);
    }

    #[test]
    fn store_error_becomes_persistence_error() {
        let err: SubscriptionError = StoreError::database("deadlock detected").into();
        assert_eq!(
            err,
            SubscriptionError::Persistence("Database error: deadlock detected".to_string())
        );
    }
}
