//! Protocol constants for Veilpay.
//!
//! All sizes derive from secp256k1 and the Ethereum address format.

// ═══════════════════════════════════════════════════════════════════════════════
// SECP256K1 SIZES
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of an uncompressed secp256k1 public key including the 0x04 prefix byte.
pub const UNCOMPRESSED_PUBKEY_SIZE: usize = 65;

/// Size of a bare X‖Y coordinate pair without the prefix byte.
///
/// Some upstream producers publish public keys in this form; both this and
/// the 65-byte form are accepted (see `veilpay-crypto`).
pub const RAW_PUBKEY_SIZE: usize = 64;

/// Prefix byte marking an uncompressed SEC1 point encoding.
pub const UNCOMPRESSED_PUBKEY_PREFIX: u8 = 0x04;

/// Size of a secp256k1 scalar (private key) in bytes.
pub const SCALAR_SIZE: usize = 32;

// ═══════════════════════════════════════════════════════════════════════════════
// ETHEREUM FORMATS
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of an Ethereum address in bytes.
pub const ETH_ADDRESS_SIZE: usize = 20;

/// Size of a transaction hash in bytes.
pub const TX_HASH_SIZE: usize = 32;

/// Size of an x402 authorization nonce in bytes.
pub const NONCE_SIZE: usize = 32;

/// Size of an r‖s‖v recoverable ECDSA signature in bytes.
pub const SIGNATURE_SIZE: usize = 65;

// ═══════════════════════════════════════════════════════════════════════════════
// AUTHORIZATION TIMING
// ═══════════════════════════════════════════════════════════════════════════════

/// Backwards skew applied to `valid_after` when building an authorization,
/// tolerating clock drift between client and verifier.
pub const VALID_AFTER_SKEW_SECS: i64 = 600;

/// Authorizations expiring within this margin are rejected at verification
/// time rather than raced against settlement.
pub const SETTLE_SAFETY_MARGIN_SECS: i64 = 6;

// ═══════════════════════════════════════════════════════════════════════════════
// INDEXER BOUNDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum number of blocks a single scan cycle will look back.
///
/// Bounds worst-case cycle latency after an outage. Gaps older than this
/// before a restart are never backfilled automatically and require an
/// out-of-band replay.
pub const DEFAULT_MAX_BLOCKS_PER_SCAN: u64 = 10_000;

/// Default block-range chunk size per event query, bounded by typical RPC
/// event-query limits.
pub const DEFAULT_CHUNK_SIZE: u64 = 500;
