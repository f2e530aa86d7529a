//! Capability traits for Veilpay.
//!
//! These traits define the seams between the protocol core and the outside
//! world: the ledger contract, the record store, and the signing key. Each is
//! an injected capability so implementations can be swapped for tests,
//! hardware-backed signers, or durable storage engines.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{EthAddress, IndexerCursor, PaymentEvent, PaymentRecord, TxHash};

// ═══════════════════════════════════════════════════════════════════════════════
// LEDGER CLIENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Arguments of the ledger's `transferWithAuthorization` entry point.
///
/// The contract re-validates the signature, timing window, balance, and nonce
/// itself — it is the source of truth; protocol-level verification only gives
/// fast, cheap rejection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationCall {
    /// The token holder authorizing the transfer.
    pub from: EthAddress,
    /// The transfer recipient.
    pub to: EthAddress,
    /// Transfer value in the token's smallest units.
    pub value: u128,
    /// Start of the validity window (Unix seconds).
    pub valid_after: i64,
    /// End of the validity window (Unix seconds).
    pub valid_before: i64,
    /// Single-use random nonce.
    pub nonce: [u8; 32],
    /// EIP-712 signature over the authorization, r‖s‖v.
    pub signature: [u8; 65],
}

/// Receipt of a submitted ledger transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    /// Hash of the transaction.
    pub tx_hash: TxHash,
    /// Whether the transaction executed successfully.
    pub success: bool,
    /// Block the transaction was included in.
    pub block_number: u64,
}

/// Read/write interface to the black-box ledger contract.
///
/// The core only needs the two read calls, one write call, and the typed
/// event query; a production implementation wraps an RPC endpoint, while
/// `veilpay-ledger` provides a deterministic in-process one.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Returns the current chain head block number.
    async fn head_block(&self) -> Result<u64>;

    /// Returns the token balance of an address, in smallest units.
    async fn balance_of(&self, address: EthAddress) -> Result<u128>;

    /// Returns true if the authorization nonce was already consumed.
    async fn authorization_state(&self, authorizer: EthAddress, nonce: [u8; 32]) -> Result<bool>;

    /// Submits a gasless transfer authorization and waits for inclusion.
    async fn transfer_with_authorization(&self, call: AuthorizationCall) -> Result<TxReceipt>;

    /// Queries typed payment events in the inclusive block range.
    async fn payment_events(&self, from_block: u64, to_block: u64) -> Result<Vec<PaymentEvent>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAYMENT STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Durable keyed store for payment records and the indexer cursor.
///
/// Any backend with upsert-by-unique-key semantics suffices; `veilpay-store`
/// provides a thread-safe in-memory implementation.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts or refreshes a record keyed by `tx_hash`.
    ///
    /// Idempotent: re-upserting an already-stored event is a no-op write and
    /// must not reset an existing `claimed = true` back to false.
    async fn upsert(&self, record: PaymentRecord) -> Result<()>;

    /// Fetches a record by transaction hash.
    async fn get(&self, tx_hash: TxHash) -> Result<Option<PaymentRecord>>;

    /// Returns a merchant's records ordered by `(block_number, tx_index)`.
    async fn by_merchant(&self, merchant_id: EthAddress) -> Result<Vec<PaymentRecord>>;

    /// Flips a record's `claimed` flag.
    async fn mark_claimed(
        &self,
        tx_hash: TxHash,
        claimed_at: i64,
        claimed_tx: Option<TxHash>,
    ) -> Result<()>;

    /// Returns the current scan cursor (block 0 if never advanced).
    async fn cursor(&self) -> Result<IndexerCursor>;

    /// Advances the cursor; rewinds are ignored (cursor never decreases).
    async fn advance_cursor(&self, block: u64) -> Result<()>;

    /// Returns the total number of stored records.
    async fn count(&self) -> Result<u64>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIGNER
// ═══════════════════════════════════════════════════════════════════════════════

/// A signing capability over 32-byte digests.
///
/// Injected rather than held as a module-level singleton so it can be swapped
/// for a hardware-backed or multi-tenant signer.
pub trait Signer: Send + Sync {
    /// The Ethereum address controlled by this signer.
    fn address(&self) -> EthAddress;

    /// Signs a prehashed 32-byte digest, returning an r‖s‖v signature.
    fn sign_digest(&self, digest: [u8; 32]) -> Result<[u8; 65]>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_call_equality() {
        let call = AuthorizationCall {
            from: EthAddress::from_array([1; 20]),
            to: EthAddress::from_array([2; 20]),
            value: 1000,
            valid_after: 0,
            valid_before: 600,
            nonce: [7; 32],
            signature: [9; 65],
        };
        assert_eq!(call.clone(), call);
    }
}
