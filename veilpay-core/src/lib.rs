//! # Veilpay Core
//!
//! Core types, errors, and traits for the Veilpay stealth payment protocol.
//!
//! This crate provides the foundational building blocks used by all other Veilpay crates:
//!
//! - **Types**: Domain models for addresses, payment events, records, and the indexer cursor
//! - **Errors**: Comprehensive error types with context, including the stable
//!   machine-readable verification reason codes of the x402 protocol
//! - **Constants**: Protocol constants and sizes
//! - **Traits**: Capability interfaces (`LedgerClient`, `PaymentStore`, `Signer`)
//!
//! ## Example
//!
//! ```rust
//! use veilpay_core::EthAddress;
//!
//! let addr = EthAddress::from_hex("0x3CB9B3bBfde8501f411bB69Ad3DC07908ED0dE20").unwrap();
//! assert!(!addr.is_zero());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{Result, VeilpayError, VerificationError};
pub use traits::*;
pub use types::*;
