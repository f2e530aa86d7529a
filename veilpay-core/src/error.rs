//! Error types for Veilpay.
//!
//! This module provides a comprehensive error hierarchy using `thiserror`.
//! Verification failures of the x402 protocol carry stable machine-readable
//! reason codes that callers can surface alongside a human summary.

use thiserror::Error;

/// Result type alias using `VeilpayError`.
pub type Result<T> = std::result::Result<T, VeilpayError>;

/// Main error type for all Veilpay operations.
#[derive(Debug, Error)]
pub enum VeilpayError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CRYPTOGRAPHIC ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Malformed key material (wrong length, wrong prefix, off-curve point).
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Invalid key or point size.
    #[error("Invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize { expected: usize, actual: usize },

    /// A curve operation produced or received the point at infinity.
    #[error("Curve operation failed: {0}")]
    CurveError(String),

    /// ECDSA signing or recovery failed.
    #[error("Signature error: {0}")]
    SignatureError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // STEALTH ADDRESS ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Invalid stealth meta-address format or content.
    #[error("Invalid meta-address: {0}")]
    InvalidMetaAddress(String),

    /// Invalid stealth address format.
    #[error("Invalid stealth address: {0}")]
    InvalidStealthAddress(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // AUTHORIZATION PROTOCOL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// An authorization failed the server-side verification pass.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// Settlement submitted but the receipt reported failure.
    #[error("Transaction failed: {tx_hash}")]
    TransactionFailed {
        /// Hash of the failed ledger transaction.
        tx_hash: String,
    },

    /// Settlement submitted but the confirmation wait timed out.
    ///
    /// Must be resolved by querying `authorization_state` for the nonce
    /// before any retry decision; never resubmit blindly.
    #[error("Settlement pending: confirmation wait timed out for tx {tx_hash}")]
    SettlementPending {
        /// Hash of the submitted transaction.
        tx_hash: String,
    },

    /// Malformed transport header (bad base64, bad UTF-8, bad JSON).
    #[error("Invalid payment header: {0}")]
    InvalidHeader(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // LEDGER / INDEXER ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// RPC call failed.
    #[error("RPC call failed: {0}")]
    RpcError(String),

    /// Event query for one block chunk failed.
    #[error("Chunk query failed for blocks {from_block}..={to_block}: {reason}")]
    ChunkQueryFailed {
        /// First block of the failed chunk.
        from_block: u64,
        /// Last block of the failed chunk.
        to_block: u64,
        /// Underlying failure.
        reason: String,
    },

    /// Payment record not found.
    #[error("Payment record not found: {0}")]
    RecordNotFound(String),

    /// Storage backend error.
    #[error("Store error: {0}")]
    StoreError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid hex encoding.
    #[error("Invalid hex encoding: {0}")]
    HexError(#[from] hex::FromHexError),

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION / INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Input validation failed.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl VeilpayError {
    /// Returns true if this error is transient (retry on the next cycle).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            VeilpayError::RpcError(_)
                | VeilpayError::ChunkQueryFailed { .. }
                | VeilpayError::SettlementPending { .. }
        )
    }

    /// Returns true if this is an input-validation error (never retried).
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            VeilpayError::ValidationError(_)
                | VeilpayError::InvalidKeyMaterial(_)
                | VeilpayError::InvalidKeySize { .. }
                | VeilpayError::InvalidMetaAddress(_)
                | VeilpayError::InvalidStealthAddress(_)
                | VeilpayError::InvalidHeader(_)
        )
    }

    /// Returns true if this is a protocol-constraint violation: reported to
    /// the caller with its reason code, not retried with the same payload.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, VeilpayError::Verification(_))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VERIFICATION REASON CODES
// ═══════════════════════════════════════════════════════════════════════════════

/// A failed check of the server-side authorization verification pass.
///
/// Checks run in a fixed order and short-circuit on the first failure; each
/// variant maps to one stable reason-code string surfaced to clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Payment scheme is not `"exact"`.
    #[error("unsupported payment scheme: {0}")]
    UnsupportedScheme(String),

    /// `authorization.to` does not match the required `pay_to` address.
    #[error("authorization recipient does not match required pay_to address")]
    RecipientMismatch,

    /// `authorization.value` is below the required amount.
    #[error("authorized value {value} below required amount {required}")]
    InsufficientAmount {
        /// Value the payer authorized.
        value: String,
        /// Amount the requirements demand.
        required: String,
    },

    /// `valid_after` lies in the future.
    #[error("authorization not yet valid (valid_after {valid_after}, now {now})")]
    NotYetValid {
        /// Start of the validity window.
        valid_after: i64,
        /// Verification time.
        now: i64,
    },

    /// `valid_before` has elapsed or falls inside the settlement safety margin.
    #[error("authorization expired (valid_before {valid_before}, now {now})")]
    Expired {
        /// End of the validity window.
        valid_before: i64,
        /// Verification time.
        now: i64,
    },

    /// Payer's token balance is below the authorized value.
    #[error("payer balance insufficient for authorized value")]
    InsufficientFunds,

    /// The authorization nonce was already consumed on-ledger.
    #[error("authorization nonce already used")]
    NonceAlreadyUsed,

    /// Recovered signer does not equal `authorization.from`.
    #[error("authorization signature invalid")]
    InvalidSignature,
}

impl VerificationError {
    /// Stable machine-readable reason code for transport to clients.
    pub fn reason_code(&self) -> &'static str {
        match self {
            VerificationError::UnsupportedScheme(_) => "unsupported_scheme",
            VerificationError::RecipientMismatch => "recipient_mismatch",
            VerificationError::InsufficientAmount { .. } => "insufficient_amount",
            VerificationError::NotYetValid { .. } => "not_yet_valid",
            VerificationError::Expired { .. } => "expired",
            VerificationError::InsufficientFunds => "insufficient_funds",
            VerificationError::NonceAlreadyUsed => "nonce_already_used",
            VerificationError::InvalidSignature => "invalid_signature",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VeilpayError::InvalidKeySize {
            expected: 65,
            actual: 33,
        };
        assert!(err.to_string().contains("65"));
        assert!(err.to_string().contains("33"));
    }

    #[test]
    fn test_error_classification() {
        assert!(VeilpayError::RpcError("test".into()).is_recoverable());
        assert!(VeilpayError::ChunkQueryFailed {
            from_block: 1,
            to_block: 500,
            reason: "timeout".into()
        }
        .is_recoverable());
        assert!(!VeilpayError::InvalidKeyMaterial("test".into()).is_recoverable());

        assert!(VeilpayError::InvalidHeader("bad base64".into()).is_validation_error());
        assert!(VeilpayError::from(VerificationError::NonceAlreadyUsed).is_protocol_violation());
    }

    #[test]
    fn test_reason_codes_are_stable() {
        let cases: Vec<(VerificationError, &str)> = vec![
            (
                VerificationError::UnsupportedScheme("permit".into()),
                "unsupported_scheme",
            ),
            (VerificationError::RecipientMismatch, "recipient_mismatch"),
            (
                VerificationError::InsufficientAmount {
                    value: "5".into(),
                    required: "10".into(),
                },
                "insufficient_amount",
            ),
            (
                VerificationError::NotYetValid {
                    valid_after: 100,
                    now: 50,
                },
                "not_yet_valid",
            ),
            (
                VerificationError::Expired {
                    valid_before: 50,
                    now: 100,
                },
                "expired",
            ),
            (VerificationError::InsufficientFunds, "insufficient_funds"),
            (VerificationError::NonceAlreadyUsed, "nonce_already_used"),
            (VerificationError::InvalidSignature, "invalid_signature"),
        ];

        for (err, code) in cases {
            assert_eq!(err.reason_code(), code);
        }
    }

    #[test]
    fn test_json_error_conversion() {
        let json_result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("invalid");
        let veilpay_result: Result<serde_json::Value> = json_result.map_err(VeilpayError::from);
        assert!(matches!(veilpay_result, Err(VeilpayError::JsonError(_))));
    }
}
