//! Stripe webhook signature verification.
//!
//! Verifies HMAC-SHA256 signatures computed over the exact request bytes and
//! rejects events whose signed timestamp falls outside the tolerance window.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::VerificationError;
use super::stripe_event::StripeEvent;

type HmacSha256 = Hmac<Sha256>;

/// Default maximum age for webhook events (5 minutes).
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components from the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// Every v1 signature present. Stripe sends several while a secret rotates.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a Stripe-Signature header string.
    ///
    /// Format: `t=<timestamp>,v1=<signature>[,v1=<signature>...][,v0=<legacy>]`
    ///
    /// Unknown keys (including `v0`) are ignored. A `v1` entry that is not
    /// valid hex is skipped rather than failing the whole header.
    pub fn parse(header: &str) -> Result<Self, VerificationError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part.trim().split_once('=').ok_or_else(|| {
                VerificationError::MalformedHeader("invalid header format".to_string())
            })?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        VerificationError::MalformedHeader("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    if let Ok(sig) = hex::decode(value) {
                        v1_signatures.push(sig);
                    }
                }
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| VerificationError::MalformedHeader("missing timestamp".to_string()))?;
        if v1_signatures.is_empty() {
            return Err(VerificationError::MalformedHeader(
                "missing v1 signature".to_string(),
            ));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

/// Verifier for Stripe webhook signatures.
#[derive(Clone)]
pub struct StripeWebhookVerifier {
    /// The webhook signing secret from Stripe dashboard.
    secret: String,
    tolerance_secs: i64,
}

impl std::fmt::Debug for StripeWebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeWebhookVerifier")
            .field("secret", &"[REDACTED]")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl StripeWebhookVerifier {
    /// Creates a new verifier with the given webhook secret and the default tolerance.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Overrides how old a signed timestamp may be.
    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Verifies the webhook signature and parses the event.
    ///
    /// # Verification Steps
    ///
    /// 1. Parse the signature header
    /// 2. Validate timestamp is within acceptable range
    /// 3. Compute expected signature over `<t>.` + raw payload bytes
    /// 4. Accept if any v1 signature matches (constant-time)
    /// 5. Parse the JSON payload into a StripeEvent
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, VerificationError> {
        self.verify_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    /// Same as [`verify_and_parse`](Self::verify_and_parse) against an explicit clock.
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<StripeEvent, VerificationError> {
        let header = SignatureHeader::parse(signature_header)?;

        self.validate_timestamp(header.timestamp, now)?;

        let expected = self.compute_signature(header.timestamp, payload)?;

        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate));
        if !matched {
            return Err(VerificationError::InvalidSignature);
        }

        serde_json::from_slice(payload)
            .map_err(|e| VerificationError::MalformedPayload(e.to_string()))
    }

    fn validate_timestamp(&self, timestamp: i64, now: i64) -> Result<(), VerificationError> {
        // `t` is untrusted; a far-off value must not overflow the subtraction.
        let age = now
            .checked_sub(timestamp)
            .ok_or(VerificationError::TimestampOutOfRange)?;

        if age > self.tolerance_secs {
            return Err(VerificationError::TimestampOutOfRange);
        }

        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(VerificationError::TimestampInFuture);
        }

        Ok(())
    }

    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, VerificationError> {
        hmac_digest(self.secret.as_bytes(), timestamp, payload)
    }
}

/// HMAC-SHA256 over `<timestamp>.` followed by the payload bytes.
fn hmac_digest(
    secret: &[u8],
    timestamp: i64,
    payload: &[u8],
) -> Result<Vec<u8>, VerificationError> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| VerificationError::InvalidSignature)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Produces a hex `v1` signature the way Stripe does, for signing test deliveries.
#[doc(hidden)]
pub fn sign_payload(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, VerificationError> {
    hmac_digest(secret.as_bytes(), timestamp, payload).map(hex::encode)
}
