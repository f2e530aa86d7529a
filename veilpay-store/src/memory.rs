//! In-memory payment record store.
//!
//! Fast, thread-safe storage suitable for development, testing, and
//! single-process deployments. Records are keyed by transaction hash, which
//! makes re-scanning idempotent for free.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, instrument};

use veilpay_core::error::{Result, VeilpayError};
use veilpay_core::traits::PaymentStore;
use veilpay_core::types::{EthAddress, IndexerCursor, PaymentRecord, TxHash};

/// In-memory payment record store.
///
/// All operations are thread-safe and can be called concurrently. The
/// cursor read-modify-write is guarded by its own lock; the single-flight
/// guarantee for whole scan cycles lives in the indexer, not here.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Primary storage: tx hash → record.
    records: DashMap<TxHash, PaymentRecord>,
    /// The resumable scan position.
    cursor: RwLock<IndexerCursor>,
}

impl MemoryStore {
    /// Creates a new empty store with the cursor at block 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with preallocated record capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity(capacity),
            cursor: RwLock::new(IndexerCursor::default()),
        }
    }

    /// Removes every record and resets the cursor. Test helper.
    pub fn clear(&self) {
        self.records.clear();
        *self.cursor.write() = IndexerCursor::default();
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    #[instrument(skip(self, record), fields(tx_hash = %record.tx_hash))]
    async fn upsert(&self, record: PaymentRecord) -> Result<()> {
        match self.records.entry(record.tx_hash) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                // Re-observed event: the stored record (including any claim
                // state) wins.
                debug!("record already present, upsert is a no-op");
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
        Ok(())
    }

    async fn get(&self, tx_hash: TxHash) -> Result<Option<PaymentRecord>> {
        Ok(self.records.get(&tx_hash).map(|r| r.clone()))
    }

    async fn by_merchant(&self, merchant_id: EthAddress) -> Result<Vec<PaymentRecord>> {
        let mut records: Vec<PaymentRecord> = self
            .records
            .iter()
            .filter(|r| r.merchant_id == merchant_id)
            .map(|r| r.clone())
            .collect();
        records.sort_by_key(PaymentRecord::sort_key);
        Ok(records)
    }

    #[instrument(skip(self), fields(tx_hash = %tx_hash))]
    async fn mark_claimed(
        &self,
        tx_hash: TxHash,
        claimed_at: i64,
        claimed_tx: Option<TxHash>,
    ) -> Result<()> {
        let mut record = self
            .records
            .get_mut(&tx_hash)
            .ok_or_else(|| VeilpayError::RecordNotFound(tx_hash.to_hex_string()))?;
        record.claimed = true;
        record.claimed_at = Some(claimed_at);
        record.claimed_tx = claimed_tx;
        debug!("record marked claimed");
        Ok(())
    }

    async fn cursor(&self) -> Result<IndexerCursor> {
        Ok(*self.cursor.read())
    }

    async fn advance_cursor(&self, block: u64) -> Result<()> {
        self.cursor.write().advance(block);
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.len() as u64)
    }
}
