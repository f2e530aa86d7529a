//! The recipient's published meta-address.

use k256::PublicKey;
use serde::{Deserialize, Serialize};

use veilpay_core::error::{Result, VeilpayError};
use veilpay_crypto::{parse_public_key, xy_bytes};

/// The pair of long-term public keys a recipient publishes.
///
/// Senders use this to derive stealth addresses; the matching private halves
/// stay with the recipient (`s` to spend, `v` to detect). Created once at
/// registration; rotation means re-registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthMetaAddress {
    /// Spend public key `S = s·G`.
    #[serde(with = "pubkey_hex")]
    pub spend_pub: PublicKey,
    /// View public key `V = v·G`.
    #[serde(with = "pubkey_hex")]
    pub view_pub: PublicKey,
}

impl StealthMetaAddress {
    /// Creates a meta-address from the two public keys.
    pub fn new(spend_pub: PublicKey, view_pub: PublicKey) -> Self {
        Self {
            spend_pub,
            view_pub,
        }
    }

    /// Validates the meta-address structure.
    ///
    /// Reusing one key for both roles collapses the spend/view separation,
    /// letting anyone who can detect also spend.
    pub fn validate(&self) -> Result<()> {
        if self.spend_pub == self.view_pub {
            return Err(VeilpayError::InvalidMetaAddress(
                "spend and view keys must be distinct".into(),
            ));
        }
        Ok(())
    }

    /// Serializes to compact hex: `X_s‖Y_s‖X_v‖Y_v` (128 bytes, no prefixes).
    pub fn to_hex(&self) -> String {
        let mut bytes = Vec::with_capacity(128);
        bytes.extend_from_slice(&xy_bytes(&self.spend_pub));
        bytes.extend_from_slice(&xy_bytes(&self.view_pub));
        hex::encode(bytes)
    }

    /// Deserializes from the compact hex form.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != 128 {
            return Err(VeilpayError::InvalidMetaAddress(format!(
                "expected 128 bytes, got {}",
                bytes.len()
            )));
        }

        let meta = Self {
            spend_pub: parse_public_key(&bytes[..64])?,
            view_pub: parse_public_key(&bytes[64..])?,
        };
        meta.validate()?;
        Ok(meta)
    }
}

mod pubkey_hex {
    //! Hex serde for public keys, emitting the bare 64-byte form and
    //! accepting either accepted encoding on input.

    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(key: &PublicKey, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(xy_bytes(key)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<PublicKey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        parse_public_key(&bytes).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veilpay_crypto::generate_keypair;

    fn sample_meta() -> StealthMetaAddress {
        StealthMetaAddress::new(generate_keypair().public, generate_keypair().public)
    }

    #[test]
    fn test_hex_roundtrip() {
        let meta = sample_meta();
        let hex = meta.to_hex();
        assert_eq!(hex.len(), 256);
        let restored = StealthMetaAddress::from_hex(&hex).unwrap();
        assert_eq!(meta, restored);
    }

    #[test]
    fn test_json_roundtrip() {
        let meta = sample_meta();
        let json = serde_json::to_string(&meta).unwrap();
        let restored: StealthMetaAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, restored);
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let key = generate_keypair().public;
        let meta = StealthMetaAddress::new(key, key);
        assert!(meta.validate().is_err());
    }

    #[test]
    fn test_truncated_hex_rejected() {
        let meta = sample_meta();
        let hex = meta.to_hex();
        assert!(StealthMetaAddress::from_hex(&hex[..200]).is_err());
    }
}
