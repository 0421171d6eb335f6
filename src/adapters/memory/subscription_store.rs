//! In-memory SubscriptionStore for tests and local runs without a database.
//!
//! Mirrors the Postgres semantics: atomic create keyed by provider
//! subscription ID, idempotent cancel, latest active lookup by wallet.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{SubscriptionId, Timestamp, WalletAddress};
use crate::domain::subscription::{NewSubscription, Subscription, SubscriptionStatus, WalletLink};
use crate::ports::{CancelOutcome, CreateResult, StoreError, SubscriptionStore};

#[derive(Default)]
struct Tables {
    /// Insertion order doubles as creation order.
    subscriptions: Vec<Subscription>,
    wallets: Vec<WalletLink>,
}

/// In-memory subscription store.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    tables: RwLock<Tables>,
    fail_writes: RwLock<Option<StoreError>>,
    fail_reads: RwLock<Option<StoreError>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Makes every subsequent write fail with `err` until cleared.
    pub async fn fail_writes_with(&self, err: Option<StoreError>) {
        *self.fail_writes.write().await = err;
    }

    /// Makes every subsequent lookup fail with `err` until cleared.
    pub async fn fail_reads_with(&self, err: Option<StoreError>) {
        *self.fail_reads.write().await = err;
    }

    pub async fn subscriptions(&self) -> Vec<Subscription> {
        self.tables.read().await.subscriptions.clone()
    }

    pub async fn wallet_links(&self) -> Vec<WalletLink> {
        self.tables.read().await.wallets.clone()
    }

    pub async fn wallets_for(&self, id: SubscriptionId) -> Vec<WalletLink> {
        self.tables
            .read()
            .await
            .wallets
            .iter()
            .filter(|l| l.subscription_id == id)
            .cloned()
            .collect()
    }

    async fn check_writable(&self) -> Result<(), StoreError> {
        match self.fail_writes.read().await.as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn check_readable(&self) -> Result<(), StoreError> {
        match self.fail_reads.read().await.as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn create_subscription_with_wallet(
        &self,
        subscription: NewSubscription,
    ) -> Result<CreateResult, StoreError> {
        self.check_writable().await?;

        let mut tables = self.tables.write().await;

        if let Some(existing) = tables
            .subscriptions
            .iter()
            .find(|s| s.stripe_subscription_id == subscription.stripe_subscription_id)
        {
            return Ok(CreateResult::AlreadyExists(existing.id));
        }

        let id = SubscriptionId::new();
        let (record, link) = subscription.into_records(id, Timestamp::now());
        tables.subscriptions.push(record);
        tables.wallets.push(link);

        Ok(CreateResult::Inserted(id))
    }

    async fn mark_cancelled(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<CancelOutcome, StoreError> {
        self.check_writable().await?;

        let mut tables = self.tables.write().await;
        let now = Timestamp::now();
        let mut matched = false;

        for sub in tables
            .subscriptions
            .iter_mut()
            .filter(|s| s.stripe_subscription_id == stripe_subscription_id)
        {
            sub.status = SubscriptionStatus::Cancelled;
            sub.updated_at = now;
            matched = true;
        }

        Ok(if matched {
            CancelOutcome::Cancelled
        } else {
            CancelOutcome::NotFound
        })
    }

    async fn find_active_by_wallet(
        &self,
        wallet_address: &WalletAddress,
    ) -> Result<Option<Subscription>, StoreError> {
        self.check_readable().await?;

        let tables = self.tables.read().await;

        let found = tables
            .subscriptions
            .iter()
            .rev()
            .filter(|s| s.status.is_active())
            .find(|s| {
                tables
                    .wallets
                    .iter()
                    .any(|l| l.subscription_id == s.id && &l.wallet_address == wallet_address)
            })
            .cloned();

        Ok(found)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(s: &str) -> WalletAddress {
        WalletAddress::new(s).unwrap()
    }

    fn new_subscription(stripe_id: &str, wallet_address: &str) -> NewSubscription {
        NewSubscription {
            stripe_customer_id: "cus_1".to_string(),
            stripe_subscription_id: stripe_id.to_string(),
            stripe_session_id: "cs_1".to_string(),
            customer_email: Some("a@b.com".to_string()),
            status: SubscriptionStatus::Active,
            current_period_end: Some(Timestamp::now().add_days(30)),
            wallet_address: wallet(wallet_address),
        }
    }

    #[tokio::test]
    async fn create_writes_subscription_and_primary_link() {
        let store = InMemorySubscriptionStore::new();

        let result = store
            .create_subscription_with_wallet(new_subscription("sub_1", "0xABC"))
            .await
            .unwrap();

        let CreateResult::Inserted(id) = result else {
            panic!("expected insert, got {:?}", result);
        };
        let links = store.wallets_for(id).await;
        assert_eq!(links.len(), 1);
        assert!(links[0].is_primary);
        assert_eq!(store.subscriptions().await.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_provider_id_returns_existing() {
        let store = InMemorySubscriptionStore::new();
        let first = store
            .create_subscription_with_wallet(new_subscription("sub_1", "0xABC"))
            .await
            .unwrap();

        let second = store
            .create_subscription_with_wallet(new_subscription("sub_1", "0xABC"))
            .await
            .unwrap();

        assert_eq!(second, CreateResult::AlreadyExists(first.id()));
        assert_eq!(store.subscriptions().await.len(), 1);
        assert_eq!(store.wallet_links().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_write_leaves_nothing_behind() {
        let store = InMemorySubscriptionStore::new();
        store
            .fail_writes_with(Some(StoreError::database("disk full")))
            .await;

        let result = store
            .create_subscription_with_wallet(new_subscription("sub_1", "0xABC"))
            .await;

        assert!(result.is_err());
        assert!(store.subscriptions().await.is_empty());
        assert!(store.wallet_links().await.is_empty());
    }

    #[tokio::test]
    async fn mark_cancelled_is_idempotent() {
        let store = InMemorySubscriptionStore::new();
        store
            .create_subscription_with_wallet(new_subscription("sub_1", "0xABC"))
            .await
            .unwrap();

        assert_eq!(store.mark_cancelled("sub_1").await.unwrap(), CancelOutcome::Cancelled);
        assert_eq!(store.mark_cancelled("sub_1").await.unwrap(), CancelOutcome::Cancelled);

        let subs = store.subscriptions().await;
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].status, SubscriptionStatus::Cancelled);
    }

    #[tokio::test]
    async fn mark_cancelled_unknown_is_not_found() {
        let store = InMemorySubscriptionStore::new();
        assert_eq!(
            store.mark_cancelled("sub_missing").await.unwrap(),
            CancelOutcome::NotFound
        );
        assert!(store.subscriptions().await.is_empty());
    }

    #[tokio::test]
    async fn find_active_by_wallet_returns_latest_active() {
        let store = InMemorySubscriptionStore::new();
        store
            .create_subscription_with_wallet(new_subscription("sub_old", "0xABC"))
            .await
            .unwrap();
        let newer = store
            .create_subscription_with_wallet(new_subscription("sub_new", "0xABC"))
            .await
            .unwrap();

        let found = store.find_active_by_wallet(&wallet("0xABC")).await.unwrap().unwrap();

        assert_eq!(found.id, newer.id());
    }

    #[tokio::test]
    async fn find_active_by_wallet_skips_cancelled() {
        let store = InMemorySubscriptionStore::new();
        store
            .create_subscription_with_wallet(new_subscription("sub_1", "0xABC"))
            .await
            .unwrap();
        store.mark_cancelled("sub_1").await.unwrap();

        assert!(store.find_active_by_wallet(&wallet("0xABC")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_active_by_wallet_matches_exactly() {
        let store = InMemorySubscriptionStore::new();
        store
            .create_subscription_with_wallet(new_subscription("sub_1", "0xABC"))
            .await
            .unwrap();

        assert!(store.find_active_by_wallet(&wallet("0xabc")).await.unwrap().is_none());
        assert!(store.find_active_by_wallet(&wallet("0xDEF")).await.unwrap().is_none());
    }
}
