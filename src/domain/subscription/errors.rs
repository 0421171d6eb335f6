//! Error taxonomy for webhook verification and subscription reconciliation.
//!
//! Each variant maps to an HTTP status and a retryability flag. Any non-2xx
//! status makes the billing provider redeliver the event later.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::ValidationError;

use super::wallet_resolver::{InvalidWallet, WalletSource};

/// Failures authenticating an inbound webhook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// The `Stripe-Signature` header was absent.
    #[error("Missing signature header")]
    MissingHeader,

    /// The signature header could not be parsed.
    #[error("Malformed signature header: {0}")]
    MalformedHeader(String),

    /// Signed timestamp is older than the tolerance window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Signed timestamp is further in the future than the allowed skew.
    #[error("Timestamp in the future")]
    TimestampInFuture,

    /// No `v1` signature matched the expected digest.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signature was valid but the body is not a usable event envelope.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

/// Errors surfaced by the reconciliation engine and the entitlement query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    /// Forged, stale or unsigned event.
    #[error("Authentication failed: {0}")]
    Authentication(VerificationError),

    /// Authentic event whose body or object is missing required fields.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// None of the wallet metadata locations carried an address.
    #[error("No wallet address found for subscription {subscription_id}")]
    MissingWallet { subscription_id: String },

    /// The highest-priority wallet value was present but not a valid address.
    #[error("Invalid wallet address for subscription {subscription_id} in {location}: {reason}")]
    InvalidWallet {
        subscription_id: String,
        location: WalletSource,
        reason: String,
    },

    /// Billing provider call failed.
    #[error("Billing provider error: {message}")]
    Provider { message: String, retryable: bool },

    /// Store write or read failed; any open transaction was rolled back.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A bounded provider or store call ran out of time.
    #[error("Timed out during {operation}")]
    Timeout { operation: &'static str },

    /// Caller supplied an invalid value.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<VerificationError> for SubscriptionError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::MalformedPayload(msg) => SubscriptionError::MalformedEvent(msg),
            other => SubscriptionError::Authentication(other),
        }
    }
}

impl SubscriptionError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        SubscriptionError::MalformedEvent(msg.into())
    }

    pub fn missing_wallet(subscription_id: impl Into<String>) -> Self {
        SubscriptionError::MissingWallet {
            subscription_id: subscription_id.into(),
        }
    }

    pub fn invalid_wallet(subscription_id: impl Into<String>, err: InvalidWallet) -> Self {
        SubscriptionError::InvalidWallet {
            subscription_id: subscription_id.into(),
            location: err.location,
            reason: err.reason.to_string(),
        }
    }

    pub fn timeout(operation: &'static str) -> Self {
        SubscriptionError::Timeout { operation }
    }

    /// Returns true if a later redelivery of the same event may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SubscriptionError::Provider { retryable, .. } => *retryable,
            SubscriptionError::Persistence(_)
            | SubscriptionError::Timeout { .. }
            | SubscriptionError::MissingWallet { .. }
            | SubscriptionError::InvalidWallet { .. } => true,
            SubscriptionError::Authentication(_)
            | SubscriptionError::MalformedEvent(_)
            | SubscriptionError::Validation(_) => false,
        }
    }

    /// Maps the error to the HTTP status returned to the caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            SubscriptionError::Authentication(_)
            | SubscriptionError::MalformedEvent(_)
            | SubscriptionError::Validation(_) => StatusCode::BAD_REQUEST,

            // Wallet metadata can be attached or corrected after the first delivery.
            SubscriptionError::MissingWallet { .. } | SubscriptionError::InvalidWallet { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            SubscriptionError::Provider { .. } => StatusCode::BAD_GATEWAY,
            SubscriptionError::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            SubscriptionError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            SubscriptionError::Authentication(_) => "AUTHENTICATION_FAILED",
            SubscriptionError::MalformedEvent(_) => "MALFORMED_EVENT",
            SubscriptionError::MissingWallet { .. } => "MISSING_WALLET",
            SubscriptionError::InvalidWallet { .. } => "INVALID_WALLET",
            SubscriptionError::Provider { .. } => "PROVIDER_ERROR",
            SubscriptionError::Persistence(_) => "PERSISTENCE_ERROR",
            SubscriptionError::Timeout { .. } => "TIMEOUT",
            SubscriptionError::Validation(_) => "VALIDATION_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ══════════════════════════════════════════════════════════════
    // Conversion Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn signature_failures_become_authentication_errors() {
        let err: SubscriptionError = VerificationError::InvalidSignature.into();
        assert_eq!(
            err,
            SubscriptionError::Authentication(VerificationError::InvalidSignature)
        );
    }

    #[test]
    fn malformed_payload_becomes_malformed_event() {
        let err: SubscriptionError =
            VerificationError::MalformedPayload("missing field `type`".to_string()).into();
        assert!(matches!(err, SubscriptionError::MalformedEvent(_)));
    }

    #[test]
    fn validation_error_converts() {
        let err: SubscriptionError = ValidationError::empty_field("wallet_address").into();
        assert!(matches!(err, SubscriptionError::Validation(_)));
    }

    // ══════════════════════════════════════════════════════════════
    // Status Code Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn authentication_errors_are_bad_request() {
        for err in [
            VerificationError::MissingHeader,
            VerificationError::MalformedHeader("x".to_string()),
            VerificationError::TimestampOutOfRange,
            VerificationError::TimestampInFuture,
            VerificationError::InvalidSignature,
        ] {
            let err = SubscriptionError::from(err);
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn missing_wallet_is_not_2xx_and_retryable() {
        let err = SubscriptionError::missing_wallet("sub_1");
        assert!(!err.status_code().is_success());
        assert!(err.is_retryable());
        assert!(err.to_string().contains("sub_1"));
    }

    #[test]
    fn invalid_wallet_is_unprocessable_and_retryable() {
        let err = SubscriptionError::invalid_wallet(
            "sub_1",
            InvalidWallet {
                location: WalletSource::SubscriptionMetadata,
                reason: ValidationError::invalid_format(
                    "wallet_address",
                    "must not contain whitespace",
                ),
            },
        );
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.is_retryable());
        assert_eq!(err.code(), "INVALID_WALLET");
        assert!(err.to_string().contains("subscription_metadata"));
    }

    #[test]
    fn persistence_error_is_server_error() {
        let err = SubscriptionError::Persistence("connection reset".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_retryable());
    }

    #[test]
    fn timeout_is_service_unavailable() {
        let err = SubscriptionError::timeout("retrieve_subscription");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Timed out during retrieve_subscription");
    }

    #[test]
    fn provider_retryability_follows_flag() {
        let transient = SubscriptionError::Provider {
            message: "502 from upstream".to_string(),
            retryable: true,
        };
        let permanent = SubscriptionError::Provider {
            message: "no such subscription".to_string(),
            retryable: false,
        };
        assert!(transient.is_retryable());
        assert!(!permanent.is_retryable());
        assert_eq!(transient.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn codes_are_distinct() {
        let errors = [
            SubscriptionError::Authentication(VerificationError::MissingHeader),
            SubscriptionError::malformed("x"),
            SubscriptionError::missing_wallet("sub"),
            SubscriptionError::InvalidWallet {
                subscription_id: "sub".to_string(),
                location: WalletSource::SessionMetadata,
                reason: "x".to_string(),
            },
            SubscriptionError::Provider {
                message: "x".to_string(),
                retryable: false,
            },
            SubscriptionError::Persistence("x".to_string()),
            SubscriptionError::timeout("x"),
            SubscriptionError::Validation(ValidationError::empty_field("x")),
        ];
        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }
}
