//! # Veilpay Stealth
//!
//! The stealth-address scheme: deterministic, unlinkable one-time addresses
//! derived from a recipient's two long-term public keys, detectable only by
//! the holder of the secret view key.
//!
//! ## Scheme (secp256k1, DKSAP form)
//!
//! ```text
//! sender:    r ← random          R = r·G          shared = r·V
//!            h = keccak256(shared.x ‖ shared.y) mod n
//!            P = S + h·G         stealth_address = addr(P)
//!
//! recipient: shared = v·R        (ECDH symmetry: v·R == r·V)
//!            detect:  addr(S + h·G) == candidate?
//!            recover: stealth_sk = (s + h) mod n
//! ```
//!
//! One stealth address per payment; many per recipient identity, unlinkable
//! to each other and to the identity without the view key. The ephemeral
//! scalar `r` never leaves [`payment::generate_stealth_address`].

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod discovery;
pub mod meta;
pub mod payment;
pub mod wallet;

pub use discovery::{
    check_payment, check_payment_hex, derive_stealth_private_key, scan_event, scan_events,
    DiscoveredPayment, RecipientKeys, ScanOutcome, ScanStats,
};
pub use meta::StealthMetaAddress;
pub use payment::{generate_for_meta, generate_stealth_address, StealthPayment};
pub use wallet::StealthWallet;
