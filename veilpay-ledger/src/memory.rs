//! The in-memory ledger simulation.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;
use tracing::{debug, instrument, warn};

use veilpay_core::error::{Result, VeilpayError};
use veilpay_core::traits::{AuthorizationCall, LedgerClient, TxReceipt};
use veilpay_core::types::{EthAddress, PaymentEvent, TxHash};
use veilpay_crypto::keccak256;
use veilpay_x402::{recover_signer, signing_digest, AmountValue, Eip712Domain, Nonce, TransferAuthorization};

/// In-memory ledger: balances, nonces, events, blocks.
///
/// `transfer_with_authorization` performs the same validation the token
/// contract performs on-chain; a call that fails any check yields a receipt
/// with `success = false` rather than an error, because that is what a
/// reverted transaction looks like to a client that got a hash back.
pub struct MemoryLedger {
    domain: Eip712Domain,
    head: AtomicU64,
    tx_counter: AtomicU64,
    balances: DashMap<EthAddress, u128>,
    consumed: DashSet<(EthAddress, [u8; 32])>,
    events: RwLock<Vec<PaymentEvent>>,
    /// Block ranges whose event queries fail, for chunk-tolerance tests.
    failing_ranges: RwLock<Vec<(u64, u64)>>,
    /// Frozen clock for deterministic timing tests; wall clock when `None`.
    now_override: RwLock<Option<i64>>,
}

impl MemoryLedger {
    /// Creates a ledger validating authorizations under the given domain.
    pub fn new(domain: Eip712Domain) -> Self {
        Self {
            domain,
            head: AtomicU64::new(0),
            tx_counter: AtomicU64::new(0),
            balances: DashMap::new(),
            consumed: DashSet::new(),
            events: RwLock::new(Vec::new()),
            failing_ranges: RwLock::new(Vec::new()),
            now_override: RwLock::new(None),
        }
    }

    fn now(&self) -> i64 {
        self.now_override
            .read()
            .unwrap_or_else(|| chrono::Utc::now().timestamp())
    }

    fn next_tx_hash(&self) -> TxHash {
        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst);
        TxHash::from_array(keccak256(&n.to_be_bytes()))
    }

    fn validate(&self, call: &AuthorizationCall, now: i64) -> bool {
        if now < call.valid_after || now >= call.valid_before {
            return false;
        }
        if self.balance(call.from) < call.value {
            return false;
        }
        if self.consumed.contains(&(call.from, call.nonce)) {
            return false;
        }

        let authorization = TransferAuthorization {
            from: call.from,
            to: call.to,
            value: AmountValue(call.value),
            valid_after: call.valid_after,
            valid_before: call.valid_before,
            nonce: Nonce(call.nonce),
        };
        let digest = signing_digest(&self.domain, &authorization);
        match recover_signer(&digest, &call.signature) {
            Ok(signer) => signer == call.from,
            Err(_) => false,
        }
    }

    fn balance(&self, address: EthAddress) -> u128 {
        self.balances.get(&address).map(|b| *b).unwrap_or(0)
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Test hooks
    // ───────────────────────────────────────────────────────────────────────────

    /// Credits a balance.
    pub fn credit(&self, address: EthAddress, amount: u128) {
        *self.balances.entry(address).or_insert(0) += amount;
    }

    /// Sets a balance to an exact value.
    pub fn set_balance(&self, address: EthAddress, amount: u128) {
        self.balances.insert(address, amount);
    }

    /// Advances the head block by `n`.
    pub fn advance_blocks(&self, n: u64) -> u64 {
        self.head.fetch_add(n, Ordering::SeqCst) + n
    }

    /// Freezes the ledger clock at a fixed timestamp.
    pub fn set_now(&self, now: i64) {
        *self.now_override.write() = Some(now);
    }

    /// Appends a payment event to the log and moves the head to its block.
    pub fn emit_payment_event(&self, event: PaymentEvent) {
        self.head.fetch_max(event.block_number, Ordering::SeqCst);
        self.events.write().push(event);
    }

    /// Makes event queries overlapping `from..=to` fail until cleared.
    pub fn fail_range(&self, from: u64, to: u64) {
        self.failing_ranges.write().push((from, to));
    }

    /// Clears injected range failures.
    pub fn clear_failures(&self) {
        self.failing_ranges.write().clear();
    }
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn head_block(&self) -> Result<u64> {
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn balance_of(&self, address: EthAddress) -> Result<u128> {
        Ok(self.balance(address))
    }

    async fn authorization_state(&self, authorizer: EthAddress, nonce: [u8; 32]) -> Result<bool> {
        Ok(self.consumed.contains(&(authorizer, nonce)))
    }

    #[instrument(skip(self, call), fields(from = %call.from, to = %call.to))]
    async fn transfer_with_authorization(&self, call: AuthorizationCall) -> Result<TxReceipt> {
        let now = self.now();
        let block_number = self.advance_blocks(1);
        let tx_hash = self.next_tx_hash();

        if !self.validate(&call, now) {
            warn!(tx_hash = %tx_hash, "authorization failed contract validation, reverting");
            return Ok(TxReceipt {
                tx_hash,
                success: false,
                block_number,
            });
        }

        // Checks passed: move value and consume the nonce atomically enough
        // for a single-process simulation.
        *self.balances.entry(call.from).or_insert(0) -= call.value;
        *self.balances.entry(call.to).or_insert(0) += call.value;
        self.consumed.insert((call.from, call.nonce));

        debug!(tx_hash = %tx_hash, value = call.value, "transfer executed");
        Ok(TxReceipt {
            tx_hash,
            success: true,
            block_number,
        })
    }

    async fn payment_events(&self, from_block: u64, to_block: u64) -> Result<Vec<PaymentEvent>> {
        let overlapping = self
            .failing_ranges
            .read()
            .iter()
            .any(|&(f, t)| from_block <= t && f <= to_block);
        if overlapping {
            return Err(VeilpayError::ChunkQueryFailed {
                from_block,
                to_block,
                reason: "injected range failure".into(),
            });
        }

        Ok(self
            .events
            .read()
            .iter()
            .filter(|e| e.block_number >= from_block && e.block_number <= to_block)
            .cloned()
            .collect())
    }
}
