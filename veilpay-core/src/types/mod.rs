//! Domain types for Veilpay.
//!
//! This module provides the core data structures used throughout the protocol:
//!
//! - [`EthAddress`] / [`TxHash`]: Ethereum address and transaction-hash newtypes
//! - [`PaymentEvent`]: the typed ledger event emitted per stealth payment
//! - [`PaymentRecord`]: a materialized, claim-tracked event keyed by tx hash
//! - [`IndexerCursor`]: the resumable last-scanned-block marker

mod address;
mod record;

pub use address::*;
pub use record::*;
