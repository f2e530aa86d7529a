//! # Veilpay Crypto
//!
//! secp256k1 primitives for the Veilpay protocol: key-pair generation,
//! scalar/point arithmetic, hash-to-scalar, and public-key → Ethereum-address
//! derivation.
//!
//! All operations here are pure and stateless; curve operations on invalid
//! inputs fail closed with [`veilpay_core::VeilpayError::InvalidKeyMaterial`]
//! rather than silently producing wrong output.
//!
//! ## Public-key compatibility contract
//!
//! [`parse_public_key`] accepts BOTH of the encodings found in the wild:
//!
//! - 65 bytes: SEC1 uncompressed, `0x04 ‖ X ‖ Y`
//! - 64 bytes: bare `X ‖ Y` with the prefix byte omitted
//!
//! Anything else (wrong length, wrong prefix byte, off-curve coordinates) is
//! rejected. Upstream producers rely on both accepted forms; do not tighten
//! this rule.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod address;
pub mod hash;
pub mod keys;

pub use address::{checksum_address, public_key_to_address};
pub use hash::{keccak256, keccak256_concat};
pub use keys::{
    generate_keypair, hash_to_scalar, is_valid_public_key, mul_base, parse_public_key, point_add,
    scalar_mul, xy_bytes, KeyPair, SecretScalar,
};
