//! Wallet address resolution from billing metadata.
//!
//! The wallet can be attached at several places depending on how the checkout
//! was created. Sources are checked in a fixed priority order and the first
//! non-blank value decides. A non-blank value that is not a valid address is
//! an error; later sources are not consulted.

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::foundation::{ValidationError, WalletAddress};

use super::stripe_event::CheckoutSessionObject;

/// Metadata key carrying the wallet address.
pub const WALLET_METADATA_KEY: &str = "wallet_address";

/// Where a resolved wallet address was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletSource {
    SubscriptionMetadata,
    SessionMetadata,
    CustomerDetailsMetadata,
}

impl WalletSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletSource::SubscriptionMetadata => "subscription_metadata",
            WalletSource::SessionMetadata => "session_metadata",
            WalletSource::CustomerDetailsMetadata => "customer_details_metadata",
        }
    }
}

impl std::fmt::Display for WalletSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWallet {
    pub address: WalletAddress,
    pub source: WalletSource,
}

/// The highest-priority non-blank wallet value was not a valid address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid wallet address in {location}: {reason}")]
pub struct InvalidWallet {
    pub location: WalletSource,
    pub reason: ValidationError,
}

/// Resolves the wallet for a completed checkout.
///
/// Priority:
/// 1. subscription metadata `wallet_address`
/// 2. session metadata `wallet_address`
/// 3. session `customer_details.metadata.wallet_address`
///
/// Blank values are skipped. Returns `Ok(None)` when every source is absent
/// or blank.
pub fn resolve_wallet(
    subscription_metadata: &HashMap<String, String>,
    session: &CheckoutSessionObject,
) -> Result<Option<ResolvedWallet>, InvalidWallet> {
    let customer_details_metadata = session.customer_details.as_ref().map(|d| &d.metadata);

    let candidates = [
        (Some(subscription_metadata), WalletSource::SubscriptionMetadata),
        (Some(&session.metadata), WalletSource::SessionMetadata),
        (customer_details_metadata, WalletSource::CustomerDetailsMetadata),
    ];

    let first_non_blank = candidates.into_iter().find_map(|(metadata, source)| {
        metadata
            .and_then(|m| m.get(WALLET_METADATA_KEY))
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| (raw, source))
    });

    let Some((raw, source)) = first_non_blank else {
        return Ok(None);
    };

    WalletAddress::new(raw)
        .map(|address| Some(ResolvedWallet { address, source }))
        .map_err(|reason| InvalidWallet {
            location: source,
            reason,
        })
}
