//! Stealth payment creation (sender side).

use k256::PublicKey;
use serde::{Deserialize, Serialize};

use veilpay_core::error::Result;
use veilpay_core::types::EthAddress;
use veilpay_crypto::{
    hash_to_scalar, mul_base, point_add, public_key_to_address, scalar_mul, xy_bytes, SecretScalar,
};

use crate::meta::StealthMetaAddress;

/// Everything the sender needs to make and announce a payment.
///
/// The ephemeral private scalar is consumed inside
/// [`generate_stealth_address`] and never stored; only `ephemeral_pub`
/// (`R = r·G`) travels with the payment for the recipient's ECDH detection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StealthPayment {
    /// The one-time address to send funds to.
    pub stealth_address: EthAddress,
    /// The ephemeral public key to publish alongside the payment.
    #[serde(with = "hex")]
    pub ephemeral_pub: Vec<u8>,
}

impl StealthPayment {
    /// Parses the published ephemeral key back into a curve point.
    pub fn ephemeral_public_key(&self) -> Result<PublicKey> {
        veilpay_crypto::parse_public_key(&self.ephemeral_pub)
    }
}

/// Derives a one-time stealth address for the recipient's key pair.
///
/// Draws an ephemeral scalar `r`, computes `shared = r·V`,
/// `h = H(shared)`, `P = S + h·G`, and the address of `P`. Returns the
/// address together with `R = r·G`; `r` itself is dropped here.
pub fn generate_stealth_address(
    spend_pub: &PublicKey,
    view_pub: &PublicKey,
) -> Result<StealthPayment> {
    let ephemeral = SecretScalar::random();
    let ephemeral_pub = ephemeral.public_key();

    let shared = scalar_mul(view_pub, &ephemeral.as_scalar())?;
    let h = hash_to_scalar(&xy_bytes(&shared));
    let stealth_pub = point_add(spend_pub, &mul_base(&h)?)?;

    // SEC1 uncompressed with prefix; downstream consumers may strip it.
    let mut encoded = Vec::with_capacity(65);
    encoded.push(0x04);
    encoded.extend_from_slice(&xy_bytes(&ephemeral_pub));

    Ok(StealthPayment {
        stealth_address: public_key_to_address(&stealth_pub),
        ephemeral_pub: encoded,
    })
}

/// Derives a stealth address for a published meta-address.
pub fn generate_for_meta(meta: &StealthMetaAddress) -> Result<StealthPayment> {
    meta.validate()?;
    generate_stealth_address(&meta.spend_pub, &meta.view_pub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use veilpay_crypto::generate_keypair;

    #[test]
    fn test_generate_stealth_address() {
        let spend = generate_keypair();
        let view = generate_keypair();

        let payment = generate_stealth_address(&spend.public, &view.public).unwrap();
        assert!(!payment.stealth_address.is_zero());
        assert_eq!(payment.ephemeral_pub.len(), 65);
        assert_eq!(payment.ephemeral_pub[0], 0x04);
        assert!(payment.ephemeral_public_key().is_ok());
    }

    #[test]
    fn test_unlinkability_across_draws() {
        // Same recipient, independent ephemeral draws: addresses never repeat.
        let spend = generate_keypair();
        let view = generate_keypair();

        let mut addresses = HashSet::new();
        let mut ephemerals = HashSet::new();
        for _ in 0..100 {
            let payment = generate_stealth_address(&spend.public, &view.public).unwrap();
            assert!(addresses.insert(payment.stealth_address));
            assert!(ephemerals.insert(payment.ephemeral_pub));
        }
    }

    #[test]
    fn test_different_recipients_different_addresses() {
        let view = generate_keypair();
        let spend_a = generate_keypair();
        let spend_b = generate_keypair();

        let a = generate_stealth_address(&spend_a.public, &view.public).unwrap();
        let b = generate_stealth_address(&spend_b.public, &view.public).unwrap();
        assert_ne!(a.stealth_address, b.stealth_address);
    }

    #[test]
    fn test_generate_for_meta_validates() {
        let key = generate_keypair().public;
        let meta = StealthMetaAddress::new(key, key);
        assert!(generate_for_meta(&meta).is_err());
    }

    #[test]
    fn test_payment_serialization() {
        let spend = generate_keypair();
        let view = generate_keypair();
        let payment = generate_stealth_address(&spend.public, &view.public).unwrap();

        let json = serde_json::to_string(&payment).unwrap();
        let restored: StealthPayment = serde_json::from_str(&json).unwrap();
        assert_eq!(payment.stealth_address, restored.stealth_address);
        assert_eq!(payment.ephemeral_pub, restored.ephemeral_pub);
    }
}
