//! # Veilpay Ledger
//!
//! A deterministic in-process ledger implementing
//! [`veilpay_core::LedgerClient`]: token balances, consumed authorization
//! nonces, a payment event log, and a block counter. It re-validates
//! `transferWithAuthorization` calls the way the real contract does, so the
//! protocol's belt-and-suspenders settlement path is exercisable without an
//! RPC endpoint.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod memory;

pub use memory::MemoryLedger;
