//! EIP-712 typed-data hashing and signature recovery for EIP-3009
//! `TransferWithAuthorization`.
//!
//! The digest binds the authorization to one token contract on one chain
//! through the domain separator, so a signature for one asset can never be
//! replayed against another.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::PublicKey;

use veilpay_core::error::{Result, VeilpayError};
use veilpay_core::types::EthAddress;
use veilpay_crypto::{keccak256, keccak256_concat, public_key_to_address};

use crate::types::TransferAuthorization;

/// Type string of the EIP-712 domain, fields in canonical EIP-712 order.
const DOMAIN_TYPE: &[u8] =
    b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Type string of the EIP-3009 transfer authorization.
const AUTHORIZATION_TYPE: &[u8] = b"TransferWithAuthorization(address from,address to,uint256 value,uint256 validAfter,uint256 validBefore,bytes32 nonce)";

/// The EIP-712 signing domain of a token contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip712Domain {
    /// Token name, e.g. `"USD Coin"`.
    pub name: String,
    /// Token EIP-712 version, e.g. `"2"`.
    pub version: String,
    /// Chain id the contract is deployed on.
    pub chain_id: u64,
    /// The token contract address.
    pub verifying_contract: EthAddress,
}

impl Eip712Domain {
    /// Computes the domain separator hash.
    pub fn separator(&self) -> [u8; 32] {
        let mut encoded = Vec::with_capacity(5 * 32);
        encoded.extend_from_slice(&keccak256(DOMAIN_TYPE));
        encoded.extend_from_slice(&keccak256(self.name.as_bytes()));
        encoded.extend_from_slice(&keccak256(self.version.as_bytes()));
        encoded.extend_from_slice(&abi_u64(self.chain_id));
        encoded.extend_from_slice(&abi_address(&self.verifying_contract));
        keccak256(&encoded)
    }
}

/// Left-pads an address to a 32-byte ABI word.
fn abi_address(address: &EthAddress) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// Encodes a u64 as a 32-byte big-endian ABI word.
fn abi_u64(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Encodes a u128 as a 32-byte big-endian ABI word.
fn abi_u128(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Hashes the authorization struct per EIP-712.
fn struct_hash(authorization: &TransferAuthorization) -> [u8; 32] {
    let mut encoded = Vec::with_capacity(7 * 32);
    encoded.extend_from_slice(&keccak256(AUTHORIZATION_TYPE));
    encoded.extend_from_slice(&abi_address(&authorization.from));
    encoded.extend_from_slice(&abi_address(&authorization.to));
    encoded.extend_from_slice(&abi_u128(authorization.value.0));
    encoded.extend_from_slice(&abi_u64(authorization.valid_after.max(0) as u64));
    encoded.extend_from_slice(&abi_u64(authorization.valid_before.max(0) as u64));
    encoded.extend_from_slice(&authorization.nonce.0);
    keccak256(&encoded)
}

/// Computes the 32-byte digest the payer signs:
/// `keccak256(0x19 ‖ 0x01 ‖ domainSeparator ‖ structHash)`.
pub fn signing_digest(domain: &Eip712Domain, authorization: &TransferAuthorization) -> [u8; 32] {
    keccak256_concat(&[
        &[0x19, 0x01],
        &domain.separator(),
        &struct_hash(authorization),
    ])
}

/// Recovers the signer address from a digest and an r‖s‖v signature.
///
/// Accepts both v ∈ {27, 28} (Ethereum convention) and v ∈ {0, 1}.
pub fn recover_signer(digest: &[u8; 32], signature: &[u8; 65]) -> Result<EthAddress> {
    let v = signature[64];
    let recovery_byte = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        other => {
            return Err(VeilpayError::SignatureError(format!(
                "invalid recovery byte {other}"
            )))
        }
    };
    let recovery_id = RecoveryId::from_byte(recovery_byte)
        .ok_or_else(|| VeilpayError::SignatureError(format!("invalid recovery byte {v}")))?;

    let sig = Signature::from_slice(&signature[..64])
        .map_err(|e| VeilpayError::SignatureError(e.to_string()))?;

    let verifying_key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|e| VeilpayError::SignatureError(e.to_string()))?;

    Ok(public_key_to_address(&PublicKey::from(&verifying_key)))
}
