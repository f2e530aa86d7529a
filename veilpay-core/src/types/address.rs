//! Address and hash newtypes.
//!
//! - [`EthAddress`]: 20-byte Ethereum address
//! - [`TxHash`]: 32-byte transaction hash, the natural idempotency key for
//!   payment records

use serde::{Deserialize, Serialize};

use crate::constants::{ETH_ADDRESS_SIZE, TX_HASH_SIZE};
use crate::error::{Result, VeilpayError};

// ═══════════════════════════════════════════════════════════════════════════════
// ETHEREUM ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// A 20-byte Ethereum address.
///
/// Stealth addresses, pay-to addresses, and asset contract addresses all use
/// this type. Comparison is byte-wise; hex parsing accepts any casing with or
/// without a `0x` prefix, so candidate addresses from event logs compare
/// case-insensitively by construction.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EthAddress {
    bytes: [u8; ETH_ADDRESS_SIZE],
}

impl Serialize for EthAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_string())
    }
}

impl<'de> Deserialize<'de> for EthAddress {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl EthAddress {
    /// Creates an address from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ETH_ADDRESS_SIZE {
            return Err(VeilpayError::InvalidStealthAddress(format!(
                "expected {} bytes, got {}",
                ETH_ADDRESS_SIZE,
                bytes.len()
            )));
        }

        let mut arr = [0u8; ETH_ADDRESS_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Creates from a fixed-size array.
    pub fn from_array(bytes: [u8; ETH_ADDRESS_SIZE]) -> Self {
        Self { bytes }
    }

    /// Parses from hex string (any casing, with or without 0x prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the address as a fixed-size array.
    pub fn to_array(&self) -> [u8; ETH_ADDRESS_SIZE] {
        self.bytes
    }

    /// Returns the lowercase hex string with 0x prefix.
    ///
    /// EIP-55 checksummed display lives in `veilpay-crypto`, which has the
    /// keccak dependency.
    pub fn to_hex_string(&self) -> String {
        format!("0x{}", hex::encode(self.bytes))
    }

    /// Compares against a hex string, ignoring casing and 0x prefix.
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        match Self::from_hex(other) {
            Ok(parsed) => parsed == *self,
            Err(_) => false,
        }
    }

    /// Returns the zero address.
    pub fn zero() -> Self {
        Self {
            bytes: [0u8; ETH_ADDRESS_SIZE],
        }
    }

    /// Returns true if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }
}

impl std::fmt::Debug for EthAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EthAddress({})", self.to_hex_string())
    }
}

impl std::fmt::Display for EthAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSACTION HASH
// ═══════════════════════════════════════════════════════════════════════════════

/// A 32-byte transaction hash.
///
/// Uniquely identifies a [`crate::PaymentRecord`]; re-scanning the same event
/// never duplicates a record because upserts key on this value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash {
    bytes: [u8; TX_HASH_SIZE],
}

impl Serialize for TxHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_string())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl TxHash {
    /// Creates a hash from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != TX_HASH_SIZE {
            return Err(VeilpayError::ValidationError(format!(
                "tx hash must be {} bytes, got {}",
                TX_HASH_SIZE,
                bytes.len()
            )));
        }

        let mut arr = [0u8; TX_HASH_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Creates from a fixed-size array.
    pub fn from_array(bytes: [u8; TX_HASH_SIZE]) -> Self {
        Self { bytes }
    }

    /// Parses from hex string (with or without 0x prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the hex string with 0x prefix.
    pub fn to_hex_string(&self) -> String {
        format!("0x{}", hex::encode(self.bytes))
    }
}

impl std::fmt::Debug for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TxHash({})", self.to_hex_string())
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_eth_address_hex_roundtrip() {
        let addr = EthAddress::from_array([0x12; 20]);
        let hex = addr.to_hex_string();
        let addr2 = EthAddress::from_hex(&hex).unwrap();
        assert_eq!(addr, addr2);
    }

    #[test_case("0xABCDEFabcdefABCDEFabcdefABCDEFabcdefABCD" ; "mixed case with prefix")]
    #[test_case("abcdefabcdefabcdefabcdefabcdefabcdefabcd" ; "lowercase without prefix")]
    #[test_case("ABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD" ; "uppercase without prefix")]
    fn test_eth_address_case_insensitive(s: &str) {
        let canonical = EthAddress::from_hex("0xabcdefabcdefabcdefabcdefabcdefabcdefabcd").unwrap();
        assert!(canonical.eq_ignore_case(s));
    }

    #[test]
    fn test_eth_address_wrong_length_rejected() {
        assert!(EthAddress::from_bytes(&[0u8; 19]).is_err());
        assert!(EthAddress::from_bytes(&[0u8; 21]).is_err());
        assert!(EthAddress::from_hex("0x1234").is_err());
    }

    #[test]
    fn test_eth_address_zero() {
        let zero = EthAddress::zero();
        assert!(zero.is_zero());

        let non_zero = EthAddress::from_array([1; 20]);
        assert!(!non_zero.is_zero());
    }

    #[test]
    fn test_tx_hash_roundtrip() {
        let hash = TxHash::from_array([0xAB; 32]);
        let hex = hash.to_hex_string();
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 66);
        assert_eq!(TxHash::from_hex(&hex).unwrap(), hash);
    }

    #[test]
    fn test_serde_uses_hex_strings() {
        let addr = EthAddress::from_array([0x12; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0x1212121212121212121212121212121212121212\"");
        assert_eq!(serde_json::from_str::<EthAddress>(&json).unwrap(), addr);

        let hash = TxHash::from_array([0xCD; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(serde_json::from_str::<TxHash>(&json).unwrap(), hash);
    }

    #[test]
    fn test_tx_hash_wrong_length_rejected() {
        assert!(TxHash::from_bytes(&[0u8; 31]).is_err());
        assert!(TxHash::from_hex("0xdeadbeef").is_err());
    }
}
