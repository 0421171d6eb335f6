//! Persisted subscription and wallet link records.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SubscriptionId, Timestamp, WalletAddress};

use super::SubscriptionStatus;

/// One billing-provider subscription instance as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
    pub stripe_session_id: String,
    pub customer_email: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// True when the stored period end is strictly after `now`.
    ///
    /// A missing period end counts as expired.
    pub fn is_current_at(&self, now: &Timestamp) -> bool {
        self.current_period_end
            .map(|end| end.is_after(now))
            .unwrap_or(false)
    }
}

/// Association between a subscription and a wallet address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletLink {
    pub subscription_id: SubscriptionId,
    pub wallet_address: WalletAddress,
    pub is_primary: bool,
    pub created_at: Timestamp,
}

/// Everything needed to insert a subscription together with its primary wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
    pub stripe_session_id: String,
    pub customer_email: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<Timestamp>,
    pub wallet_address: WalletAddress,
}

impl NewSubscription {
    /// Materializes the rows this insert produces.
    pub fn into_records(self, id: SubscriptionId, now: Timestamp) -> (Subscription, WalletLink) {
        let subscription = Subscription {
            id,
            stripe_customer_id: self.stripe_customer_id,
            stripe_subscription_id: self.stripe_subscription_id,
            stripe_session_id: self.stripe_session_id,
            customer_email: self.customer_email,
            status: self.status,
            current_period_end: self.current_period_end,
            created_at: now,
            updated_at: now,
        };
        let link = WalletLink {
            subscription_id: id,
            wallet_address: self.wallet_address,
            is_primary: true,
            created_at: now,
        };
        (subscription, link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_subscription(period_end: Option<Timestamp>) -> NewSubscription {
        NewSubscription {
            stripe_customer_id: "cus_1".to_string(),
            stripe_subscription_id: "sub_1".to_string(),
            stripe_session_id: "cs_1".to_string(),
            customer_email: Some("a@b.com".to_string()),
            status: SubscriptionStatus::Active,
            current_period_end: period_end,
            wallet_address: WalletAddress::new("0xABC").unwrap(),
        }
    }

    #[test]
    fn into_records_links_primary_wallet_to_subscription() {
        let id = SubscriptionId::new();
        let now = Timestamp::now();

        let (subscription, link) = new_subscription(None).into_records(id, now);

        assert_eq!(subscription.id, id);
        assert_eq!(link.subscription_id, id);
        assert!(link.is_primary);
        assert_eq!(link.wallet_address.as_str(), "0xABC");
        assert_eq!(subscription.created_at, now);
        assert_eq!(subscription.updated_at, now);
    }

    #[test]
    fn is_current_at_compares_period_end() {
        let now = Timestamp::now();
        let (future, _) =
            new_subscription(Some(now.add_days(1))).into_records(SubscriptionId::new(), now);
        let (past, _) =
            new_subscription(Some(now.add_days(-1))).into_records(SubscriptionId::new(), now);

        assert!(future.is_current_at(&now));
        assert!(!past.is_current_at(&now));
    }

    #[test]
    fn missing_period_end_is_not_current() {
        let now = Timestamp::now();
        let (subscription, _) = new_subscription(None).into_records(SubscriptionId::new(), now);
        assert!(!subscription.is_current_at(&now));
    }
}
