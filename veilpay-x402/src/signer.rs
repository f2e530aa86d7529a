//! In-process ECDSA signer backed by a k256 key.

use k256::ecdsa::SigningKey;

use veilpay_core::error::{Result, VeilpayError};
use veilpay_core::traits::Signer;
use veilpay_core::types::EthAddress;
use veilpay_crypto::{public_key_to_address, SecretScalar};

/// A [`Signer`] holding its secp256k1 key in process memory.
///
/// Suitable for clients and tests; production facilitators may substitute a
/// hardware-backed implementation of the same trait.
pub struct LocalSigner {
    secret: SecretScalar,
    address: EthAddress,
}

impl LocalSigner {
    /// Wraps an existing secret scalar.
    pub fn new(secret: SecretScalar) -> Self {
        let address = public_key_to_address(&secret.public_key());
        Self { secret, address }
    }

    /// Generates a signer with a fresh random key.
    pub fn random() -> Self {
        Self::new(SecretScalar::random())
    }

    /// Reconstructs a signer from a stored 32-byte private key.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::new(SecretScalar::from_bytes(bytes)?))
    }
}

impl Signer for LocalSigner {
    fn address(&self) -> EthAddress {
        self.address
    }

    fn sign_digest(&self, digest: [u8; 32]) -> Result<[u8; 65]> {
        let signing_key = SigningKey::from_bytes(&self.secret.to_bytes().into())
            .map_err(|e| VeilpayError::SignatureError(e.to_string()))?;
        let (signature, recovery_id) = signing_key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| VeilpayError::SignatureError(e.to_string()))?;

        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = recovery_id.to_byte() + 27;
        Ok(out)
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
