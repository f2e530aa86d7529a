//! Payment events, materialized records, and the indexer cursor.

use serde::{Deserialize, Serialize};

use super::{EthAddress, TxHash};

// ═══════════════════════════════════════════════════════════════════════════════
// PAYMENT EVENT
// ═══════════════════════════════════════════════════════════════════════════════

/// The typed event the ledger contract emits for each stealth payment.
///
/// This is the wire shape the indexer queries by block range. The implicit
/// `(block_number, tx_index, tx_hash)` fields come from the enclosing
/// transaction context rather than the event body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
    /// Identifier of the merchant/service being paid.
    pub merchant_id: EthAddress,
    /// Pricing plan identifier within the merchant's catalogue.
    pub plan_id: u64,
    /// The one-time stealth address funds were sent to.
    pub stealth_address: EthAddress,
    /// Amount paid, in the token's smallest units.
    pub amount: u128,
    /// Duration the payment covers, in seconds.
    pub duration_secs: u64,
    /// Ledger timestamp of the payment (Unix seconds).
    pub timestamp: i64,
    /// The payer's ephemeral public key, published for ECDH detection.
    ///
    /// Uncompressed SEC1 bytes; producers publish both 65- and 64-byte
    /// encodings, which `veilpay_crypto::parse_public_key` accepts.
    #[serde(with = "hex")]
    pub ephemeral_pubkey: Vec<u8>,
    /// Block the event was emitted in.
    pub block_number: u64,
    /// Transaction index within the block (for stable ordering).
    pub tx_index: u32,
    /// Hash of the emitting transaction; unique per event.
    pub tx_hash: TxHash,
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAYMENT RECORD
// ═══════════════════════════════════════════════════════════════════════════════

/// A payment event materialized into the queryable store.
///
/// Created on first observation of a ledger event; mutated only to flip
/// `claimed` (by claim execution or balance-based reconciliation); never
/// deleted. `tx_hash` is the idempotency key — upserting the same event
/// again is a no-op and must not reset `claimed` to false.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    /// Identifier of the merchant/service being paid.
    pub merchant_id: EthAddress,
    /// Pricing plan identifier.
    pub plan_id: u64,
    /// The one-time stealth address funds were sent to.
    pub stealth_address: EthAddress,
    /// Amount paid, in the token's smallest units.
    pub amount: u128,
    /// Duration the payment covers, in seconds.
    pub duration_secs: u64,
    /// Ledger timestamp of the payment (Unix seconds).
    pub timestamp: i64,
    /// The payer's ephemeral public key.
    #[serde(with = "hex")]
    pub ephemeral_pubkey: Vec<u8>,
    /// Block the event was emitted in.
    pub block_number: u64,
    /// Transaction index within the block.
    pub tx_index: u32,
    /// Hash of the emitting transaction; the record's unique key.
    pub tx_hash: TxHash,
    /// Whether the funds have left the stealth address.
    pub claimed: bool,
    /// When the claim was recorded (Unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<i64>,
    /// The claiming transaction, when captured through the claim path.
    ///
    /// Balance-based reconciliation flips `claimed` without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_tx: Option<TxHash>,
}

impl PaymentRecord {
    /// Materializes a freshly observed event, defaulting `claimed = false`.
    pub fn from_event(event: PaymentEvent) -> Self {
        Self {
            merchant_id: event.merchant_id,
            plan_id: event.plan_id,
            stealth_address: event.stealth_address,
            amount: event.amount,
            duration_secs: event.duration_secs,
            timestamp: event.timestamp,
            ephemeral_pubkey: event.ephemeral_pubkey,
            block_number: event.block_number,
            tx_index: event.tx_index,
            tx_hash: event.tx_hash,
            claimed: false,
            claimed_at: None,
            claimed_tx: None,
        }
    }

    /// Ordering key for stable per-merchant retrieval.
    pub fn sort_key(&self) -> (u64, u32) {
        (self.block_number, self.tx_index)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// INDEXER CURSOR
// ═══════════════════════════════════════════════════════════════════════════════

/// The resumable scan position: last block a scan cycle covered.
///
/// Singleton and monotonically non-decreasing. Models "scanned", not "every
/// chunk succeeded" — failed chunks are logged and retried only via the next
/// cycle's bounded look-back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexerCursor {
    /// Last block number covered by a completed scan cycle.
    pub last_scanned_block: u64,
}

impl IndexerCursor {
    /// Creates a cursor at the given block.
    pub fn at(block: u64) -> Self {
        Self {
            last_scanned_block: block,
        }
    }

    /// Advances the cursor, ignoring rewinds.
    pub fn advance(&mut self, block: u64) {
        if block > self.last_scanned_block {
            self.last_scanned_block = block;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> PaymentEvent {
        PaymentEvent {
            merchant_id: EthAddress::from_array([0xAA; 20]),
            plan_id: 0,
            stealth_address: EthAddress::from_array([0xBB; 20]),
            amount: 100,
            duration_secs: 2_592_000,
            timestamp: 1_700_000_000,
            ephemeral_pubkey: vec![0x04; 65],
            block_number: 42,
            tx_index: 3,
            tx_hash: TxHash::from_array([0xCC; 32]),
        }
    }

    #[test]
    fn test_record_from_event_defaults_unclaimed() {
        let record = PaymentRecord::from_event(sample_event());
        assert!(!record.claimed);
        assert!(record.claimed_at.is_none());
        assert!(record.claimed_tx.is_none());
        assert_eq!(record.sort_key(), (42, 3));
    }

    #[test]
    fn test_record_serde_roundtrip() {
        let record = PaymentRecord::from_event(sample_event());
        let json = serde_json::to_string(&record).unwrap();
        let restored: PaymentRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, restored);
    }

    #[test]
    fn test_cursor_never_rewinds() {
        let mut cursor = IndexerCursor::at(100);
        cursor.advance(50);
        assert_eq!(cursor.last_scanned_block, 100);
        cursor.advance(150);
        assert_eq!(cursor.last_scanned_block, 150);
        cursor.advance(150);
        assert_eq!(cursor.last_scanned_block, 150);
    }
}
