//! # Veilpay Indexer
//!
//! Resumable, chunked reconstruction of the on-chain payment event stream
//! into a queryable store. One scan cycle reads from the cursor to the chain
//! head in fixed-size chunks, upserts a record per event, and advances the
//! cursor; cycles are short-lived and invoked by an external scheduler.
//!
//! The cursor models "scanned", not "every chunk succeeded": per-chunk query
//! errors are logged and skipped so partial progress is never lost, and the
//! cursor moves to the cycle's target block afterwards either way. Look-back
//! is bounded by `max_blocks_per_scan` — after a long outage the indexer
//! jumps to a recent window and reports the skipped gap rather than
//! backfilling it; replaying an old gap is an out-of-band operation.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use veilpay_core::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_BLOCKS_PER_SCAN};
use veilpay_core::error::{Result, VeilpayError};
use veilpay_core::traits::{LedgerClient, PaymentStore};
use veilpay_core::types::{EthAddress, PaymentRecord};

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Scan cycle tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexerConfig {
    /// Upper bound on blocks covered by one cycle.
    ///
    /// Caps worst-case cycle latency after an outage at the cost of never
    /// auto-backfilling gaps older than this.
    pub max_blocks_per_scan: u64,
    /// Blocks per event query, bounded by the RPC's range limit.
    pub chunk_size: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            max_blocks_per_scan: DEFAULT_MAX_BLOCKS_PER_SCAN,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl IndexerConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(VeilpayError::ConfigError("chunk_size must be > 0".into()));
        }
        if self.max_blocks_per_scan == 0 {
            return Err(VeilpayError::ConfigError(
                "max_blocks_per_scan must be > 0".into(),
            ));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCAN REPORT
// ═══════════════════════════════════════════════════════════════════════════════

/// What one scan cycle covered and produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanCycleReport {
    /// First block of the scanned window.
    pub from_block: u64,
    /// Last block of the scanned window (the new cursor position).
    pub to_block: u64,
    /// Events returned by successful chunk queries.
    pub events_seen: u64,
    /// Records newly materialized this cycle.
    pub records_written: u64,
    /// Chunk queries that failed and were skipped.
    pub chunks_failed: u64,
    /// Blocks skipped by the bounded look-back, zero when caught up.
    pub gap_skipped: u64,
}

impl ScanCycleReport {
    /// True if the cycle had any blocks to scan.
    pub fn scanned_any(&self) -> bool {
        self.from_block <= self.to_block
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// INDEXER
// ═══════════════════════════════════════════════════════════════════════════════

/// The scanning loop over a ledger and a record store.
pub struct Indexer<L, S> {
    ledger: Arc<L>,
    store: Arc<S>,
    config: IndexerConfig,
    /// Single-flight guard: the cursor read-modify-write is the critical
    /// section, so only one cycle may run at a time.
    cycle_lock: Mutex<()>,
}

impl<L: LedgerClient, S: PaymentStore> Indexer<L, S> {
    /// Creates an indexer with default configuration.
    pub fn new(ledger: Arc<L>, store: Arc<S>) -> Self {
        Self {
            ledger,
            store,
            config: IndexerConfig::default(),
            cycle_lock: Mutex::new(()),
        }
    }

    /// Creates an indexer with explicit configuration.
    ///
    /// Rejects configurations with a zero chunk size or scan bound; a
    /// zero-sized chunk would stall the scan loop.
    pub fn with_config(ledger: Arc<L>, store: Arc<S>, config: IndexerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ledger,
            store,
            config,
            cycle_lock: Mutex::new(()),
        })
    }

    /// The active configuration.
    pub fn config(&self) -> IndexerConfig {
        self.config
    }

    /// Runs one scan cycle: cursor → head, chunked, idempotent.
    #[instrument(skip(self))]
    pub async fn scan_cycle(&self) -> Result<ScanCycleReport> {
        let _guard = self.cycle_lock.lock().await;

        let cursor = self.store.cursor().await?;
        let head = self.ledger.head_block().await?;

        let next = cursor.last_scanned_block + 1;
        if head < next {
            debug!(head, cursor = cursor.last_scanned_block, "no new blocks, indexer idle");
            return Ok(ScanCycleReport {
                from_block: next,
                to_block: head,
                ..ScanCycleReport::default()
            });
        }

        let floor = head.saturating_sub(self.config.max_blocks_per_scan);
        let from_block = next.max(floor);
        let gap_skipped = from_block - next;
        if gap_skipped > 0 {
            warn!(
                gap_skipped,
                from_block, "look-back bound exceeded, skipping older blocks"
            );
        }

        let count_before = self.store.count().await?;
        let mut events_seen = 0u64;
        let mut chunks_failed = 0u64;

        let mut chunk_start = from_block;
        while chunk_start <= head {
            let chunk_end = head.min(chunk_start + self.config.chunk_size - 1);
            match self.ledger.payment_events(chunk_start, chunk_end).await {
                Ok(events) => {
                    events_seen += events.len() as u64;
                    for event in events {
                        self.store.upsert(PaymentRecord::from_event(event)).await?;
                    }
                }
                Err(e) => {
                    // Partial progress is acceptable; total silence is not.
                    warn!(chunk_start, chunk_end, error = %e, "chunk query failed, skipping");
                    chunks_failed += 1;
                }
            }
            chunk_start = chunk_end + 1;
        }

        // Cursor models "scanned", so it advances even past failed chunks.
        self.store.advance_cursor(head).await?;
        let records_written = self.store.count().await? - count_before;

        let report = ScanCycleReport {
            from_block,
            to_block: head,
            events_seen,
            records_written,
            chunks_failed,
            gap_skipped,
        };
        info!(
            from = report.from_block,
            to = report.to_block,
            events = report.events_seen,
            written = report.records_written,
            failed_chunks = report.chunks_failed,
            "scan cycle complete"
        );
        Ok(report)
    }

    /// Balance-based claim reconciliation for one merchant.
    ///
    /// A zero balance on a stealth address whose record is still unclaimed
    /// means the funds left outside the normal claim path; the flag is
    /// flipped to match reality. Returns the number of records flipped.
    #[instrument(skip(self), fields(merchant = %merchant_id))]
    pub async fn reconcile_claims(&self, merchant_id: EthAddress) -> Result<u64> {
        let mut flipped = 0u64;
        let now = chrono::Utc::now().timestamp();

        for record in self.store.by_merchant(merchant_id).await? {
            if record.claimed {
                continue;
            }
            if self.ledger.balance_of(record.stealth_address).await? == 0 {
                self.store.mark_claimed(record.tx_hash, now, None).await?;
                info!(tx_hash = %record.tx_hash, "claim reconciled from zero balance");
                flipped += 1;
            }
        }

        Ok(flipped)
    }
}
