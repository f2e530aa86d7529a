//! Base64 header codec for payment payloads and settlement receipts.
//!
//! Both travel as HTTP headers, so the JSON is base64-encoded in standard
//! alphabet with padding. Decode failures are typed, never panics.

use std::fmt::Display;

use base64::prelude::{Engine, BASE64_STANDARD};
use serde::{Deserialize, Serialize};

use veilpay_core::error::{Result, VeilpayError};

use crate::types::{PaymentPayload, SettlementResponse};

/// A base64(JSON) header value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Base64Header(pub String);

impl Base64Header {
    /// Encodes any serializable value as base64(JSON).
    pub fn encode<T: Serialize>(value: &T) -> Result<Self> {
        let json = serde_json::to_string(value)?;
        Ok(Base64Header(BASE64_STANDARD.encode(json)))
    }

    /// Decodes back into a typed value.
    ///
    /// # Errors
    /// `InvalidHeader` for bad base64 or non-UTF-8 content; `JsonError` for
    /// well-formed base64 wrapping malformed JSON.
    pub fn decode<T: for<'de> Deserialize<'de>>(&self) -> Result<T> {
        let bytes = BASE64_STANDARD
            .decode(&self.0)
            .map_err(|e| VeilpayError::InvalidHeader(format!("bad base64: {e}")))?;
        let json = String::from_utf8(bytes)
            .map_err(|e| VeilpayError::InvalidHeader(format!("non-utf8 payload: {e}")))?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl Display for Base64Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&PaymentPayload> for Base64Header {
    type Error = VeilpayError;

    fn try_from(value: &PaymentPayload) -> Result<Self> {
        Base64Header::encode(value)
    }
}

impl TryFrom<&Base64Header> for PaymentPayload {
    type Error = VeilpayError;

    fn try_from(value: &Base64Header) -> Result<Self> {
        value.decode()
    }
}

impl TryFrom<&SettlementResponse> for Base64Header {
    type Error = VeilpayError;

    fn try_from(value: &SettlementResponse) -> Result<Self> {
        Base64Header::encode(value)
    }
}

impl TryFrom<&Base64Header> for SettlementResponse {
    type Error = VeilpayError;

    fn try_from(value: &Base64Header) -> Result<Self> {
        value.decode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AmountValue, ExactPaymentPayload, Nonce, SignatureBytes, TransferAuthorization,
        X402_VERSION,
    };
    use veilpay_core::types::EthAddress;

    fn payload() -> PaymentPayload {
        PaymentPayload {
            x402_version: X402_VERSION,
            scheme: "exact".into(),
            network: "base-sepolia".into(),
            payload: ExactPaymentPayload {
                signature: SignatureBytes([0x0F; 65]),
                authorization: TransferAuthorization {
                    from: EthAddress::from_array([0x11; 20]),
                    to: EthAddress::from_array([0x22; 20]),
                    value: AmountValue(99),
                    valid_after: 0,
                    valid_before: 600,
                    nonce: Nonce([0x01; 32]),
                },
            },
        }
    }

    #[test]
    fn test_payment_header_round_trip() {
        let header = Base64Header::try_from(&payload()).unwrap();
        let back = PaymentPayload::try_from(&header).unwrap();
        assert_eq!(back, payload());
    }

    #[test]
    fn test_settlement_header_round_trip() {
        let receipt = SettlementResponse {
            success: true,
            error_reason: None,
            transaction: Some("0xabc".into()),
            network: "base-sepolia".into(),
            payer: Some(EthAddress::from_array([0x11; 20])),
        };
        let header = Base64Header::try_from(&receipt).unwrap();
        assert_eq!(SettlementResponse::try_from(&header).unwrap(), receipt);
    }

    #[test]
    fn test_bad_base64_is_typed_error() {
        let header = Base64Header("!!not base64!!".into());
        assert!(matches!(
            header.decode::<PaymentPayload>(),
            Err(VeilpayError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_bad_json_is_typed_error() {
        let header = Base64Header(BASE64_STANDARD.encode("{\"nope\": true}"));
        assert!(matches!(
            header.decode::<PaymentPayload>(),
            Err(VeilpayError::JsonError(_))
        ));
    }
}
