//! Payment verification and settlement.
//!
//! Verification runs eight checks in a fixed order and short-circuits at
//! the first failure, each with a distinct stable reason code. The order is
//! part of the protocol contract: cheap local checks first, ledger reads
//! next, signature recovery last.
//!
//! Settlement re-checks the local constraints defensively and then submits
//! the authorization to the ledger, which re-validates everything itself.
//! The contract is the source of truth; protocol verification only exists
//! for fast rejection before paying for a ledger write.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use veilpay_core::constants::SETTLE_SAFETY_MARGIN_SECS;
use veilpay_core::error::{Result, VeilpayError, VerificationError};
use veilpay_core::traits::{AuthorizationCall, LedgerClient};
use veilpay_core::types::{EthAddress, TxHash};

use crate::eip712::{recover_signer, signing_digest};
use crate::requirements::{ServiceConfig, EXACT_SCHEME};
use crate::transport::Base64Header;
use crate::types::{PaymentPayload, PaymentRequirements, SettlementResponse};

// ═══════════════════════════════════════════════════════════════════════════════
// OUTCOME TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a verification pass, wire-friendly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOutcome {
    /// Whether every check passed.
    pub is_valid: bool,
    /// The recovered payer when valid.
    pub payer: Option<EthAddress>,
    /// Stable reason code when invalid.
    pub invalid_reason: Option<&'static str>,
}

/// Result of a successful settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementResult {
    /// Always true; failures are errors, not results.
    pub success: bool,
    /// The settlement transaction hash.
    pub transaction: TxHash,
    /// The payer whose authorization settled.
    pub payer: EthAddress,
}

/// What a nonce query revealed about an ambiguous settlement.
///
/// After a wait-for-receipt timeout the only safe move is to ask the ledger
/// whether the nonce was consumed. Resubmitting without asking risks a
/// double-settle race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingResolution {
    /// The nonce is consumed: the original submission settled. Do not retry.
    AlreadySettled,
    /// The nonce is unconsumed: the submission never landed. Retry is safe.
    NotSettled,
}

/// A settled payment, kept for receipts and reconciliation queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledPayment {
    /// The address that was paid.
    pub pay_to: EthAddress,
    /// Transfer value in smallest units.
    pub amount: u128,
    /// The recovered payer.
    pub payer: EthAddress,
    /// The settlement transaction.
    pub tx_hash: TxHash,
    /// When settlement was observed (Unix seconds).
    pub settled_at: i64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// FACILITATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies payment payloads and settles them on the ledger.
pub struct Facilitator<L> {
    ledger: Arc<L>,
    config: ServiceConfig,
    settled: Mutex<Vec<SettledPayment>>,
}

impl<L: LedgerClient> Facilitator<L> {
    /// Creates a facilitator over a ledger client and service config.
    pub fn new(ledger: Arc<L>, config: ServiceConfig) -> Self {
        Self {
            ledger,
            config,
            settled: Mutex::new(Vec::new()),
        }
    }

    /// The service configuration this facilitator verifies against.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Payments settled through this facilitator, oldest first.
    pub fn settled_payments(&self) -> Vec<SettledPayment> {
        self.settled.lock().clone()
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Verification
    // ───────────────────────────────────────────────────────────────────────────

    /// Checks (1)–(3): scheme, recipient, amount. Pure and synchronous; also
    /// rerun defensively at settlement.
    fn check_local(
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> std::result::Result<(), VerificationError> {
        if payload.scheme != EXACT_SCHEME {
            return Err(VerificationError::UnsupportedScheme(payload.scheme.clone()));
        }

        let authorization = &payload.payload.authorization;
        if authorization.to != requirements.pay_to {
            return Err(VerificationError::RecipientMismatch);
        }

        if authorization.value < requirements.max_amount_required {
            return Err(VerificationError::InsufficientAmount {
                value: authorization.value.to_string(),
                required: requirements.max_amount_required.to_string(),
            });
        }

        Ok(())
    }

    /// Checks (4)–(5): the validity window against `now`, with a safety
    /// margin so settlement cannot race expiry.
    fn check_window(
        payload: &PaymentPayload,
        now: i64,
    ) -> std::result::Result<(), VerificationError> {
        let authorization = &payload.payload.authorization;

        if now < authorization.valid_after {
            return Err(VerificationError::NotYetValid {
                valid_after: authorization.valid_after,
                now,
            });
        }

        if authorization.valid_before < now + SETTLE_SAFETY_MARGIN_SECS {
            return Err(VerificationError::Expired {
                valid_before: authorization.valid_before,
                now,
            });
        }

        Ok(())
    }

    async fn verify_inner(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
        now: i64,
    ) -> Result<EthAddress> {
        // (1)–(3) local constraints.
        Self::check_local(payload, requirements).map_err(VeilpayError::Verification)?;
        // (4)–(5) timing window.
        Self::check_window(payload, now).map_err(VeilpayError::Verification)?;

        let authorization = &payload.payload.authorization;

        // (6) payer balance.
        let balance = self.ledger.balance_of(authorization.from).await?;
        if balance < authorization.value.0 {
            return Err(VerificationError::InsufficientFunds.into());
        }

        // (7) nonce not consumed.
        let consumed = self
            .ledger
            .authorization_state(authorization.from, authorization.nonce.0)
            .await?;
        if consumed {
            return Err(VerificationError::NonceAlreadyUsed.into());
        }

        // (8) signature recovers to `from`.
        let digest = signing_digest(&self.config.domain(), authorization);
        let recovered = recover_signer(&digest, &payload.payload.signature.0)
            .map_err(|_| VeilpayError::Verification(VerificationError::InvalidSignature))?;
        if recovered != authorization.from {
            return Err(VerificationError::InvalidSignature.into());
        }

        Ok(recovered)
    }

    /// Runs the full ordered verification at an explicit timestamp.
    pub async fn verify_at(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
        now: i64,
    ) -> Result<VerifyOutcome> {
        match self.verify_inner(payload, requirements, now).await {
            Ok(payer) => Ok(VerifyOutcome {
                is_valid: true,
                payer: Some(payer),
                invalid_reason: None,
            }),
            Err(VeilpayError::Verification(reason)) => {
                warn!(reason = reason.reason_code(), "payment verification failed");
                Ok(VerifyOutcome {
                    is_valid: false,
                    payer: None,
                    invalid_reason: Some(reason.reason_code()),
                })
            }
            Err(other) => Err(other),
        }
    }

    /// Runs the full ordered verification at the current wall clock.
    #[instrument(skip_all, fields(payer = %payload.payload.authorization.from))]
    pub async fn verify(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<VerifyOutcome> {
        self.verify_at(payload, requirements, chrono::Utc::now().timestamp())
            .await
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Settlement
    // ───────────────────────────────────────────────────────────────────────────

    /// Settles a verified payment at an explicit timestamp.
    pub async fn settle_at(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
        now: i64,
    ) -> Result<SettlementResult> {
        // Re-check local constraints; the payload may not be the one that
        // was verified.
        Self::check_local(payload, requirements).map_err(VeilpayError::Verification)?;

        let authorization = payload.payload.authorization;
        let receipt = self
            .ledger
            .transfer_with_authorization(AuthorizationCall {
                from: authorization.from,
                to: authorization.to,
                value: authorization.value.0,
                valid_after: authorization.valid_after,
                valid_before: authorization.valid_before,
                nonce: authorization.nonce.0,
                signature: payload.payload.signature.0,
            })
            .await?;

        if !receipt.success {
            return Err(VeilpayError::TransactionFailed {
                tx_hash: receipt.tx_hash.to_hex_string(),
            });
        }

        info!(tx_hash = %receipt.tx_hash, payer = %authorization.from, "payment settled");
        self.settled.lock().push(SettledPayment {
            pay_to: authorization.to,
            amount: authorization.value.0,
            payer: authorization.from,
            tx_hash: receipt.tx_hash,
            settled_at: now,
        });

        Ok(SettlementResult {
            success: true,
            transaction: receipt.tx_hash,
            payer: authorization.from,
        })
    }

    /// Settles a verified payment at the current wall clock.
    #[instrument(skip_all, fields(payer = %payload.payload.authorization.from))]
    pub async fn settle(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettlementResult> {
        self.settle_at(payload, requirements, chrono::Utc::now().timestamp())
            .await
    }

    /// Resolves an ambiguous settlement by querying nonce state.
    ///
    /// Call after a wait-for-receipt timeout, before any retry decision.
    pub async fn resolve_pending(
        &self,
        from: EthAddress,
        nonce: [u8; 32],
    ) -> Result<PendingResolution> {
        if self.ledger.authorization_state(from, nonce).await? {
            Ok(PendingResolution::AlreadySettled)
        } else {
            Ok(PendingResolution::NotSettled)
        }
    }

    /// Builds the base64 receipt header for a settlement result.
    pub fn receipt_header(&self, result: &SettlementResult) -> Result<Base64Header> {
        Base64Header::encode(&SettlementResponse {
            success: result.success,
            error_reason: None,
            transaction: Some(result.transaction.to_hex_string()),
            network: self.config.network.clone(),
            payer: Some(result.payer),
        })
    }
}
