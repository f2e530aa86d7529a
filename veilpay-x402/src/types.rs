//! Wire types for the payment-authorization protocol.
//!
//! Everything here crosses an HTTP boundary as JSON, camelCase per the
//! protocol convention. Amounts travel as decimal strings so JavaScript
//! consumers never lose precision; binary fields travel as 0x-hex.

use std::fmt::Display;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use veilpay_core::constants::{NONCE_SIZE, SIGNATURE_SIZE};
use veilpay_core::types::EthAddress;

/// Protocol version carried in every payload and challenge.
pub const X402_VERSION: u32 = 1;

// ═══════════════════════════════════════════════════════════════════════════════
// AMOUNT
// ═══════════════════════════════════════════════════════════════════════════════

/// A token amount in smallest units, decimal-string on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AmountValue(pub u128);

impl From<u128> for AmountValue {
    fn from(value: u128) -> Self {
        AmountValue(value)
    }
}

impl From<u64> for AmountValue {
    fn from(value: u64) -> Self {
        AmountValue(value as u128)
    }
}

impl Display for AmountValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for AmountValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AmountValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let value = u128::from_str(&s).map_err(serde::de::Error::custom)?;
        Ok(AmountValue(value))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NONCE AND SIGNATURE
// ═══════════════════════════════════════════════════════════════════════════════

/// A single-use 32-byte authorization nonce, 0x-hex on the wire.
///
/// Random per payment; the ledger contract stores consumed nonces per
/// authorizer, which is what makes replayed authorizations fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce(pub [u8; NONCE_SIZE]);

impl Nonce {
    /// Draws a fresh random nonce from the OS RNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Nonce(bytes)
    }

    /// Returns the 0x-prefixed hex encoding.
    pub fn to_hex_string(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl Serialize for Nonce {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_string())
    }
}

impl<'de> Deserialize<'de> for Nonce {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(&s))
            .map_err(serde::de::Error::custom)?;
        let arr: [u8; NONCE_SIZE] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("nonce must be 32 bytes"))?;
        Ok(Nonce(arr))
    }
}

/// A 65-byte r‖s‖v ECDSA signature, 0x-hex on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureBytes(pub [u8; SIGNATURE_SIZE]);

impl Serialize for SignatureBytes {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for SignatureBytes {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(&s))
            .map_err(serde::de::Error::custom)?;
        let arr: [u8; SIGNATURE_SIZE] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("signature must be 65 bytes"))?;
        Ok(SignatureBytes(arr))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// AUTHORIZATION PAYLOAD
// ═══════════════════════════════════════════════════════════════════════════════

/// The EIP-3009 `TransferWithAuthorization` message the payer signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferAuthorization {
    /// The token holder authorizing the transfer.
    pub from: EthAddress,
    /// The transfer recipient.
    pub to: EthAddress,
    /// Transfer value in smallest units.
    pub value: AmountValue,
    /// Start of the validity window (Unix seconds).
    pub valid_after: i64,
    /// End of the validity window (Unix seconds).
    pub valid_before: i64,
    /// Single-use random nonce.
    pub nonce: Nonce,
}

/// The `"exact"` scheme payload: a signed authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactPaymentPayload {
    /// EIP-712 signature over the authorization.
    pub signature: SignatureBytes,
    /// The signed message.
    pub authorization: TransferAuthorization,
}

/// The full payment payload carried in the payment header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    /// Protocol version; always [`X402_VERSION`].
    pub x402_version: u32,
    /// Scheme name; only `"exact"` is supported.
    pub scheme: String,
    /// Network identifier the authorization targets.
    pub network: String,
    /// The scheme-specific payload.
    pub payload: ExactPaymentPayload,
}

// ═══════════════════════════════════════════════════════════════════════════════
// REQUIREMENTS AND RESPONSES
// ═══════════════════════════════════════════════════════════════════════════════

/// One acceptable way to pay for a resource.
///
/// Built from a [`crate::ServiceConfig`] and returned inside a
/// [`PaymentRequiredResponse`]; issuing it has no side effects, so the
/// challenge is idempotent and safely repeatable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// Scheme name, `"exact"`.
    pub scheme: String,
    /// Network identifier.
    pub network: String,
    /// Maximum amount required, smallest units.
    pub max_amount_required: AmountValue,
    /// Resource URL this payment unlocks.
    pub resource: String,
    /// Human-readable description of the resource.
    pub description: String,
    /// MIME type of the resource.
    pub mime_type: String,
    /// Address the payment must be made to.
    pub pay_to: EthAddress,
    /// Seconds the client has to complete the payment.
    pub max_timeout_seconds: u64,
    /// Token contract address.
    pub asset: EthAddress,
    /// Extensibility bag; carries the EIP-712 domain name/version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// The 402-style challenge body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequiredResponse {
    /// Protocol version.
    pub x402_version: u32,
    /// Why payment is required (or which prior attempt failed).
    pub error: String,
    /// Acceptable payment methods.
    pub accepts: Vec<PaymentRequirements>,
}

/// Settlement receipt returned to the client in the response header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponse {
    /// Whether settlement succeeded.
    pub success: bool,
    /// Failure reason code when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    /// Settlement transaction hash when successful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    /// Network the settlement happened on.
    pub network: String,
    /// The recovered payer address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<EthAddress>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_authorization() -> TransferAuthorization {
        TransferAuthorization {
            from: EthAddress::from_array([0x11; 20]),
            to: EthAddress::from_array([0x22; 20]),
            value: AmountValue(250_000),
            valid_after: 1_700_000_000,
            valid_before: 1_700_000_300,
            nonce: Nonce([0xAB; 32]),
        }
    }

    #[test]
    fn test_amount_value_string_serde() {
        let json = serde_json::to_string(&AmountValue(u128::MAX)).unwrap();
        assert_eq!(json, format!("\"{}\"", u128::MAX));
        let back: AmountValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, AmountValue(u128::MAX));
    }

    #[test]
    fn test_amount_value_rejects_non_decimal() {
        assert!(serde_json::from_str::<AmountValue>("\"0x10\"").is_err());
        assert!(serde_json::from_str::<AmountValue>("\"-5\"").is_err());
        assert!(serde_json::from_str::<AmountValue>("100").is_err());
    }

    #[test]
    fn test_nonce_random_distinct() {
        assert_ne!(Nonce::random(), Nonce::random());
    }

    #[test]
    fn test_payload_camel_case_wire_format() {
        let payload = PaymentPayload {
            x402_version: X402_VERSION,
            scheme: "exact".into(),
            network: "base-sepolia".into(),
            payload: ExactPaymentPayload {
                signature: SignatureBytes([0x01; 65]),
                authorization: sample_authorization(),
            },
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["x402Version"], 1);
        assert_eq!(json["scheme"], "exact");
        assert_eq!(
            json["payload"]["authorization"]["validAfter"],
            1_700_000_000i64
        );
        assert_eq!(json["payload"]["authorization"]["value"], "250000");
        assert!(json["payload"]["signature"]
            .as_str()
            .unwrap()
            .starts_with("0x"));

        let back: PaymentPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_requirements_extra_omitted_when_none() {
        let requirements = PaymentRequirements {
            scheme: "exact".into(),
            network: "base-sepolia".into(),
            max_amount_required: AmountValue(100),
            resource: "https://api.example.com/premium".into(),
            description: "Premium feed".into(),
            mime_type: "application/json".into(),
            pay_to: EthAddress::from_array([0x33; 20]),
            max_timeout_seconds: 300,
            asset: EthAddress::from_array([0x44; 20]),
            extra: None,
        };

        let json = serde_json::to_value(&requirements).unwrap();
        assert!(json.get("extra").is_none());
        assert_eq!(json["maxAmountRequired"], "100");
        assert_eq!(json["maxTimeoutSeconds"], 300);
    }

    #[test]
    fn test_signature_wrong_length_rejected() {
        let short = format!("\"0x{}\"", "ab".repeat(64));
        assert!(serde_json::from_str::<SignatureBytes>(&short).is_err());
    }
}
