//! Key pairs, scalar/point arithmetic, and public-key parsing.
//!
//! The parsing functions implement the dual-format compatibility contract
//! described at the crate root: 65-byte SEC1-uncompressed and bare 64-byte
//! X‖Y encodings are both accepted, nothing else.

use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::{EncodedPoint, FieldBytes, NonZeroScalar, ProjectivePoint, PublicKey, Scalar, U256};
use rand::rngs::OsRng;
use zeroize::Zeroize;

use veilpay_core::constants::{
    RAW_PUBKEY_SIZE, SCALAR_SIZE, UNCOMPRESSED_PUBKEY_PREFIX, UNCOMPRESSED_PUBKEY_SIZE,
};
use veilpay_core::error::{Result, VeilpayError};

use crate::hash::keccak256;

// ═══════════════════════════════════════════════════════════════════════════════
// SECRET SCALAR
// ═══════════════════════════════════════════════════════════════════════════════

/// A non-zero secp256k1 scalar, zeroized on drop.
///
/// Used for long-term spend/view private keys, ephemeral payment scalars,
/// and recovered stealth private keys.
#[derive(Clone)]
pub struct SecretScalar {
    inner: NonZeroScalar,
}

impl SecretScalar {
    /// Draws a fresh random scalar from the OS RNG.
    pub fn random() -> Self {
        Self {
            inner: NonZeroScalar::random(&mut OsRng),
        }
    }

    /// Creates from 32 big-endian bytes.
    ///
    /// # Errors
    /// Rejects wrong lengths, values ≥ the curve order, and zero.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SCALAR_SIZE {
            return Err(VeilpayError::InvalidKeySize {
                expected: SCALAR_SIZE,
                actual: bytes.len(),
            });
        }

        let repr = FieldBytes::from_slice(bytes);
        let inner: Option<NonZeroScalar> = NonZeroScalar::from_repr(*repr).into();
        inner
            .map(|inner| Self { inner })
            .ok_or_else(|| VeilpayError::InvalidKeyMaterial("scalar out of range or zero".into()))
    }

    /// Wraps an existing scalar, rejecting zero.
    pub fn from_scalar(scalar: Scalar) -> Result<Self> {
        let inner: Option<NonZeroScalar> = NonZeroScalar::new(scalar).into();
        inner
            .map(|inner| Self { inner })
            .ok_or_else(|| VeilpayError::InvalidKeyMaterial("scalar is zero".into()))
    }

    /// Returns the 32 big-endian bytes of the scalar.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes().into()
    }

    /// Returns the scalar value.
    pub fn as_scalar(&self) -> Scalar {
        *self.inner.as_ref()
    }

    /// Returns the non-zero wrapper (for ECDSA key construction).
    pub fn as_nonzero(&self) -> &NonZeroScalar {
        &self.inner
    }

    /// Computes the corresponding public key `k·G`.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_secret_scalar(&self.inner)
    }
}

impl Drop for SecretScalar {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl std::fmt::Debug for SecretScalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretScalar([REDACTED])")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEY PAIR
// ═══════════════════════════════════════════════════════════════════════════════

/// A secp256k1 key pair.
///
/// An identity holds two of these: a *spend* pair and a *view* pair, created
/// once at registration and never rotated in-protocol.
#[derive(Clone, Debug)]
pub struct KeyPair {
    /// The private scalar (zeroized on drop).
    pub secret: SecretScalar,
    /// The public point `secret·G`.
    pub public: PublicKey,
}

impl KeyPair {
    /// Generates a fresh random key pair.
    pub fn generate() -> Self {
        let secret = SecretScalar::random();
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Reconstructs a pair from a stored private scalar.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        let secret = SecretScalar::from_bytes(bytes)?;
        let public = secret.public_key();
        Ok(Self { secret, public })
    }
}

/// Generates a fresh random key pair.
pub fn generate_keypair() -> KeyPair {
    KeyPair::generate()
}

// ═══════════════════════════════════════════════════════════════════════════════
// PUBLIC KEY PARSING — COMPATIBILITY CONTRACT
// ═══════════════════════════════════════════════════════════════════════════════

/// Parses a public key from either accepted encoding.
///
/// Accepts a 65-byte SEC1-uncompressed key (`0x04` prefix) or a bare 64-byte
/// X‖Y pair; rejects every other length, a 65-byte input with a wrong prefix
/// byte, and coordinate pairs not on the curve. The 64-byte leniency exists
/// because upstream producers sometimes omit the prefix — this is a
/// compatibility contract, not an oversight; do not tighten it.
pub fn parse_public_key(bytes: &[u8]) -> Result<PublicKey> {
    let encoded = match bytes.len() {
        UNCOMPRESSED_PUBKEY_SIZE => {
            if bytes[0] != UNCOMPRESSED_PUBKEY_PREFIX {
                return Err(VeilpayError::InvalidKeyMaterial(format!(
                    "expected uncompressed prefix 0x04, got 0x{:02x}",
                    bytes[0]
                )));
            }
            EncodedPoint::from_bytes(bytes)
                .map_err(|e| VeilpayError::InvalidKeyMaterial(e.to_string()))?
        }
        RAW_PUBKEY_SIZE => {
            let mut prefixed = [0u8; UNCOMPRESSED_PUBKEY_SIZE];
            prefixed[0] = UNCOMPRESSED_PUBKEY_PREFIX;
            prefixed[1..].copy_from_slice(bytes);
            EncodedPoint::from_bytes(prefixed)
                .map_err(|e| VeilpayError::InvalidKeyMaterial(e.to_string()))?
        }
        other => {
            return Err(VeilpayError::InvalidKeySize {
                expected: UNCOMPRESSED_PUBKEY_SIZE,
                actual: other,
            })
        }
    };

    let parsed: Option<PublicKey> = PublicKey::from_encoded_point(&encoded).into();
    parsed.ok_or_else(|| VeilpayError::InvalidKeyMaterial("coordinates not on curve".into()))
}

/// Returns true if the bytes parse under the dual-format rule.
pub fn is_valid_public_key(bytes: &[u8]) -> bool {
    parse_public_key(bytes).is_ok()
}

/// Returns the bare 64-byte X‖Y coordinates of a public key.
pub fn xy_bytes(public: &PublicKey) -> [u8; 64] {
    let encoded = public.to_encoded_point(false);
    let mut out = [0u8; 64];
    out.copy_from_slice(&encoded.as_bytes()[1..]);
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// POINT ARITHMETIC
// ═══════════════════════════════════════════════════════════════════════════════

/// Multiplies a public point by a scalar: `k·P`.
///
/// Fails closed if the result is the point at infinity (only possible for a
/// zero scalar).
pub fn scalar_mul(point: &PublicKey, scalar: &Scalar) -> Result<PublicKey> {
    let product = ProjectivePoint::from(*point) * scalar;
    affine_checked(product)
}

/// Adds two public points: `P1 + P2`.
///
/// Fails closed if the sum is the point at infinity (`P2 == -P1`).
pub fn point_add(p1: &PublicKey, p2: &PublicKey) -> Result<PublicKey> {
    let sum = ProjectivePoint::from(*p1) + ProjectivePoint::from(*p2);
    affine_checked(sum)
}

/// Multiplies the generator by a scalar: `k·G`.
pub fn mul_base(scalar: &Scalar) -> Result<PublicKey> {
    affine_checked(ProjectivePoint::GENERATOR * scalar)
}

fn affine_checked(point: ProjectivePoint) -> Result<PublicKey> {
    PublicKey::from_affine(point.to_affine())
        .map_err(|_| VeilpayError::CurveError("result is the point at infinity".into()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// HASH TO SCALAR
// ═══════════════════════════════════════════════════════════════════════════════

/// Hashes bytes to a curve scalar: `keccak256(input) mod n`.
///
/// The stealth scheme uses this for `h = H(sharedSecret)` over the shared
/// point's X‖Y coordinates.
pub fn hash_to_scalar(input: &[u8]) -> Scalar {
    let digest = keccak256(input);
    <Scalar as Reduce<U256>>::reduce_bytes(&digest.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_generate_keypair_distinct() {
        let a = generate_keypair();
        let b = generate_keypair();
        assert_ne!(a.secret.to_bytes(), b.secret.to_bytes());
        assert_ne!(xy_bytes(&a.public), xy_bytes(&b.public));
    }

    #[test]
    fn test_secret_roundtrip() {
        let pair = generate_keypair();
        let restored = KeyPair::from_secret_bytes(&pair.secret.to_bytes()).unwrap();
        assert_eq!(restored.public, pair.public);
    }

    #[test]
    fn test_zero_scalar_rejected() {
        assert!(SecretScalar::from_bytes(&[0u8; 32]).is_err());
        assert!(SecretScalar::from_scalar(Scalar::ZERO).is_err());
    }

    #[test]
    fn test_dual_format_acceptance() {
        let pair = generate_keypair();
        let uncompressed = pair.public.to_encoded_point(false);
        let with_prefix = uncompressed.as_bytes();
        let bare = &with_prefix[1..];

        // The compatibility contract: both encodings parse to the same key.
        let from_prefixed = parse_public_key(with_prefix).unwrap();
        let from_bare = parse_public_key(bare).unwrap();
        assert_eq!(from_prefixed, pair.public);
        assert_eq!(from_bare, pair.public);

        assert!(is_valid_public_key(with_prefix));
        assert!(is_valid_public_key(bare));
    }

    #[test]
    fn test_wrong_prefix_rejected() {
        let pair = generate_keypair();
        let mut bytes = pair.public.to_encoded_point(false).as_bytes().to_vec();
        bytes[0] = 0x02; // compressed prefix on a 65-byte body
        assert!(parse_public_key(&bytes).is_err());
        bytes[0] = 0x05;
        assert!(parse_public_key(&bytes).is_err());
    }

    #[test_case(0 ; "empty")]
    #[test_case(33 ; "compressed length")]
    #[test_case(63 ; "one short of bare")]
    #[test_case(66 ; "one past prefixed")]
    fn test_wrong_length_rejected(len: usize) {
        assert!(!is_valid_public_key(&vec![0x04; len]));
    }

    #[test]
    fn test_off_curve_rejected() {
        // X = Y = 1 is not a curve point.
        let mut bytes = [0u8; 64];
        bytes[31] = 1;
        bytes[63] = 1;
        assert!(parse_public_key(&bytes).is_err());
    }

    #[test]
    fn test_scalar_mul_distributes_over_generator() {
        // (a·b)·G == a·(b·G)
        let a = SecretScalar::random();
        let b = SecretScalar::random();

        let ab = a.as_scalar() * b.as_scalar();
        let lhs = mul_base(&ab).unwrap();
        let rhs = scalar_mul(&b.public_key(), &a.as_scalar()).unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_point_add_matches_scalar_add() {
        // (a+b)·G == a·G + b·G
        let a = SecretScalar::random();
        let b = SecretScalar::random();

        let sum_scalar = a.as_scalar() + b.as_scalar();
        let lhs = mul_base(&sum_scalar).unwrap();
        let rhs = point_add(&a.public_key(), &b.public_key()).unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_point_add_infinity_fails_closed() {
        let pair = generate_keypair();
        let neg =
            PublicKey::from_affine((-ProjectivePoint::from(pair.public)).to_affine()).unwrap();
        assert!(point_add(&pair.public, &neg).is_err());
    }

    #[test]
    fn test_scalar_mul_zero_fails_closed() {
        let pair = generate_keypair();
        assert!(scalar_mul(&pair.public, &Scalar::ZERO).is_err());
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(64))]

        #[test]
        fn prop_dual_format_parses_to_same_key(seed in proptest::prelude::any::<[u8; 32]>()) {
            let pair = match KeyPair::from_secret_bytes(&seed) {
                Ok(p) => p,
                Err(_) => return Ok(()),
            };
            let encoded = pair.public.to_encoded_point(false);
            let prefixed = encoded.as_bytes();

            proptest::prop_assert_eq!(parse_public_key(prefixed).unwrap(), pair.public);
            proptest::prop_assert_eq!(parse_public_key(&prefixed[1..]).unwrap(), pair.public);
        }
    }

    #[test]
    fn test_hash_to_scalar_deterministic() {
        let h1 = hash_to_scalar(b"shared secret bytes");
        let h2 = hash_to_scalar(b"shared secret bytes");
        let h3 = hash_to_scalar(b"different bytes");
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }
}
