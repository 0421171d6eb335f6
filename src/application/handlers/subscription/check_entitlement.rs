//! CheckEntitlementHandler - answers whether a wallet currently has a subscription.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{Timestamp, WalletAddress};
use crate::domain::subscription::{Entitlement, SubscriptionError};
use crate::ports::SubscriptionStore;

use super::reconcile_billing_event::bounded;

/// Query for a wallet's entitlement.
#[derive(Debug, Clone)]
pub struct CheckEntitlementQuery {
    pub wallet_address: String,
}

/// Handler for entitlement queries.
pub struct CheckEntitlementHandler {
    store: Arc<dyn SubscriptionStore>,
    query_timeout: Duration,
}

impl CheckEntitlementHandler {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self {
            store,
            query_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub async fn handle(&self, query: CheckEntitlementQuery) -> Result<Entitlement, SubscriptionError> {
        let wallet = WalletAddress::new(&query.wallet_address)?;

        let subscription = bounded(
            self.query_timeout,
            "find_active_by_wallet",
            self.store.find_active_by_wallet(&wallet),
        )
        .await
        .map_err(|e| {
            tracing::error!(wallet_address = %wallet, error = %e, "Entitlement lookup failed");
            e
        })?;

        let entitlement = Entitlement::evaluate(subscription.as_ref(), &Timestamp::now());

        tracing::debug!(
            wallet_address = %wallet,
            status = entitlement.status_label(),
            "Entitlement checked"
        );

        Ok(entitlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionStore;
    use crate::domain::foundation::SubscriptionId;
    use crate::domain::subscription::{NewSubscription, Subscription, SubscriptionStatus};
    use crate::ports::{CancelOutcome, CreateResult, StoreError};
    use async_trait::async_trait;

    fn new_subscription(stripe_id: &str, period_end: Option<Timestamp>) -> NewSubscription {
        NewSubscription {
            stripe_customer_id: "cus_1".to_string(),
            stripe_subscription_id: stripe_id.to_string(),
            stripe_session_id: "cs_1".to_string(),
            customer_email: Some("a@b.com".to_string()),
            status: SubscriptionStatus::Active,
            current_period_end: period_end,
            wallet_address: WalletAddress::new("0xABC").unwrap(),
        }
    }

    fn query(wallet: &str) -> CheckEntitlementQuery {
        CheckEntitlementQuery {
            wallet_address: wallet.to_string(),
        }
    }

    struct FailingStore;

    #[async_trait]
    impl SubscriptionStore for FailingStore {
        async fn create_subscription_with_wallet(
            &self,
            _subscription: NewSubscription,
        ) -> Result<CreateResult, StoreError> {
            Ok(CreateResult::Inserted(SubscriptionId::new()))
        }

        async fn mark_cancelled(&self, _id: &str) -> Result<CancelOutcome, StoreError> {
            Ok(CancelOutcome::NotFound)
        }

        async fn find_active_by_wallet(
            &self,
            _wallet_address: &WalletAddress,
        ) -> Result<Option<Subscription>, StoreError> {
            Err(StoreError::database("connection refused"))
        }
    }

    #[tokio::test]
    async fn unknown_wallet_is_none() {
        let handler = CheckEntitlementHandler::new(Arc::new(InMemorySubscriptionStore::new()));

        let result = handler.handle(query("0xNOBODY")).await.unwrap();

        assert_eq!(result, Entitlement::None);
    }

    #[tokio::test]
    async fn current_subscription_is_entitled() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let end = Timestamp::now().add_days(10);
        store
            .create_subscription_with_wallet(new_subscription("sub_1", Some(end)))
            .await
            .unwrap();
        let handler = CheckEntitlementHandler::new(store);

        let result = handler.handle(query("0xABC")).await.unwrap();

        assert_eq!(
            result,
            Entitlement::Entitled {
                expires_at: end,
                customer_email: Some("a@b.com".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn stale_active_row_is_expired() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        store
            .create_subscription_with_wallet(new_subscription(
                "sub_1",
                Some(Timestamp::now().add_days(-1)),
            ))
            .await
            .unwrap();
        let handler = CheckEntitlementHandler::new(store);

        assert_eq!(handler.handle(query("0xABC")).await.unwrap(), Entitlement::Expired);
    }

    #[tokio::test]
    async fn cancelled_subscription_is_none() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        store
            .create_subscription_with_wallet(new_subscription(
                "sub_1",
                Some(Timestamp::now().add_days(10)),
            ))
            .await
            .unwrap();
        store.mark_cancelled("sub_1").await.unwrap();
        let handler = CheckEntitlementHandler::new(store);

        assert_eq!(handler.handle(query("0xABC")).await.unwrap(), Entitlement::None);
    }

    #[tokio::test]
    async fn blank_wallet_is_validation_error() {
        let handler = CheckEntitlementHandler::new(Arc::new(InMemorySubscriptionStore::new()));

        let err = handler.handle(query("   ")).await.unwrap_err();

        assert!(matches!(err, SubscriptionError::Validation(_)));
    }

    #[tokio::test]
    async fn store_failure_is_persistence_error() {
        let handler = CheckEntitlementHandler::new(Arc::new(FailingStore));

        let err = handler.handle(query("0xABC")).await.unwrap_err();

        assert!(matches!(err, SubscriptionError::Persistence(_)));
    }
}
