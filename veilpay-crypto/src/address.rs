//! Public-key → Ethereum-address derivation and EIP-55 checksums.

use k256::PublicKey;

use veilpay_core::types::EthAddress;

use crate::hash::keccak256;
use crate::keys::xy_bytes;

/// Derives the Ethereum address of a public key.
///
/// keccak256 of the bare X‖Y coordinates (prefix byte stripped), low 20
/// bytes.
pub fn public_key_to_address(public: &PublicKey) -> EthAddress {
    let hash = keccak256(&xy_bytes(public));
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    EthAddress::from_array(bytes)
}

/// Returns the EIP-55 mixed-case checksum string of an address.
///
/// A hex nibble is uppercased when the corresponding nibble of
/// `keccak256(lowercase_hex_address)` is ≥ 8.
pub fn checksum_address(address: &EthAddress) -> String {
    let lower = hex::encode(address.as_bytes());
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if ch.is_ascii_alphabetic() && nibble >= 8 {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{generate_keypair, SecretScalar};

    #[test]
    fn test_address_size_and_determinism() {
        let pair = generate_keypair();
        let a1 = public_key_to_address(&pair.public);
        let a2 = public_key_to_address(&pair.public);
        assert_eq!(a1, a2);
        assert!(!a1.is_zero());
    }

    #[test]
    fn test_known_address_vector() {
        // Private key 1 maps to the generator point; its address is a fixed
        // Ethereum vector.
        let mut one = [0u8; 32];
        one[31] = 1;
        let secret = SecretScalar::from_bytes(&one).unwrap();
        let address = public_key_to_address(&secret.public_key());
        assert_eq!(
            address.to_hex_string(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_eip55_known_vectors() {
        // Vectors from the EIP-55 specification.
        let cases = [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ];
        for expected in cases {
            let address = EthAddress::from_hex(expected).unwrap();
            assert_eq!(checksum_address(&address), expected);
        }
    }

    #[test]
    fn test_different_keys_different_addresses() {
        let a = generate_keypair();
        let b = generate_keypair();
        assert_ne!(
            public_key_to_address(&a.public),
            public_key_to_address(&b.public)
        );
    }
}
