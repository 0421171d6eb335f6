//! Billing period end policy.

use crate::domain::foundation::Timestamp;

/// Length of the assumed period when the provider omits a usable period end.
pub const FALLBACK_PERIOD_DAYS: i64 = 30;

/// Where a resolved period end came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodEndSource {
    Provider,
    Fallback,
}

/// Picks the period end to persist for a newly reconciled subscription.
///
/// A provider value is used when it is a positive Unix timestamp that chrono
/// can represent. Anything else yields `now + FALLBACK_PERIOD_DAYS` so a
/// record is never stored without an expiry.
pub fn resolve_period_end(provider_value: Option<i64>, now: Timestamp) -> (Timestamp, PeriodEndSource) {
    match provider_value
        .filter(|secs| *secs > 0)
        .and_then(Timestamp::from_unix_secs)
    {
        Some(end) => (end, PeriodEndSource::Provider),
        None => (now.add_days(FALLBACK_PERIOD_DAYS), PeriodEndSource::Fallback),
    }
}
