//! Keccak-256 hashing utilities.
//!
//! Ethereum uses the original Keccak padding, not the FIPS-202 SHA-3 one;
//! `sha3::Keccak256` provides it.

use sha3::{Digest, Keccak256};

/// Computes keccak256 of a single input.
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(input);
    hasher.finalize().into()
}

/// Computes keccak256 over the concatenation of multiple inputs.
///
/// Avoids an intermediate allocation when hashing composed material such as
/// `0x1901 ‖ domain_separator ‖ struct_hash`.
pub fn keccak256_concat(inputs: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_known_vector() {
        // keccak256("") — the canonical empty-input vector
        let hash = keccak256(b"");
        assert_eq!(
            hex::encode(hash),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_keccak256_concat_matches_flat() {
        let flat = keccak256(b"hello world");
        let concat = keccak256_concat(&[b"hello ", b"world"]);
        assert_eq!(flat, concat);
    }
}
