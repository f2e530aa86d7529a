//! Client-side payment construction: build, sign, encode.

use tracing::debug;

use veilpay_core::constants::VALID_AFTER_SKEW_SECS;
use veilpay_core::error::Result;
use veilpay_core::traits::Signer;

use crate::eip712::{signing_digest, Eip712Domain};
use crate::transport::Base64Header;
use crate::types::{
    ExactPaymentPayload, Nonce, PaymentPayload, PaymentRequirements, SignatureBytes,
    TransferAuthorization, X402_VERSION,
};

/// Builds and signs a payment payload at an explicit timestamp.
///
/// The validity window opens `VALID_AFTER_SKEW_SECS` in the past so a server
/// clock running slightly behind still accepts the authorization, and closes
/// `max_timeout_seconds` ahead per the requirements. Each call draws a fresh
/// nonce; a payload is built once per payment attempt and never reused.
pub fn build_payment_at(
    signer: &dyn Signer,
    requirements: &PaymentRequirements,
    domain: &Eip712Domain,
    now: i64,
) -> Result<PaymentPayload> {
    let authorization = TransferAuthorization {
        from: signer.address(),
        to: requirements.pay_to,
        value: requirements.max_amount_required,
        valid_after: now - VALID_AFTER_SKEW_SECS,
        valid_before: now + requirements.max_timeout_seconds as i64,
        nonce: Nonce::random(),
    };

    let digest = signing_digest(domain, &authorization);
    let signature = SignatureBytes(signer.sign_digest(digest)?);
    debug!(payer = %authorization.from, nonce = %authorization.nonce.to_hex_string(), "payment signed");

    Ok(PaymentPayload {
        x402_version: X402_VERSION,
        scheme: requirements.scheme.clone(),
        network: requirements.network.clone(),
        payload: ExactPaymentPayload {
            signature,
            authorization,
        },
    })
}

/// Builds and signs a payment payload at the current wall clock.
pub fn build_payment(
    signer: &dyn Signer,
    requirements: &PaymentRequirements,
    domain: &Eip712Domain,
) -> Result<PaymentPayload> {
    build_payment_at(signer, requirements, domain, chrono::Utc::now().timestamp())
}

/// Builds, signs, and encodes a payment into its transport header.
pub fn build_payment_header(
    signer: &dyn Signer,
    requirements: &PaymentRequirements,
    domain: &Eip712Domain,
) -> Result<Base64Header> {
    Base64Header::encode(&build_payment(signer, requirements, domain)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eip712::recover_signer;
    use crate::requirements::tests::test_config;
    use crate::signer::LocalSigner;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_window_and_fields() {
        let config = test_config();
        let requirements = config.requirements();
        let signer = LocalSigner::random();

        let payload = build_payment_at(&signer, &requirements, &config.domain(), NOW).unwrap();
        let auth = &payload.payload.authorization;

        assert_eq!(auth.from, signer.address());
        assert_eq!(auth.to, requirements.pay_to);
        assert_eq!(auth.value, requirements.max_amount_required);
        assert_eq!(auth.valid_after, NOW - VALID_AFTER_SKEW_SECS);
        assert_eq!(
            auth.valid_before,
            NOW + requirements.max_timeout_seconds as i64
        );
        assert_eq!(payload.scheme, "exact");
    }

    #[test]
    fn test_fresh_nonce_per_attempt() {
        let config = test_config();
        let requirements = config.requirements();
        let signer = LocalSigner::random();

        let a = build_payment_at(&signer, &requirements, &config.domain(), NOW).unwrap();
        let b = build_payment_at(&signer, &requirements, &config.domain(), NOW).unwrap();
        assert_ne!(a.payload.authorization.nonce, b.payload.authorization.nonce);
    }

    #[test]
    fn test_signature_recovers_to_signer() {
        let config = test_config();
        let requirements = config.requirements();
        let signer = LocalSigner::random();

        let payload = build_payment_at(&signer, &requirements, &config.domain(), NOW).unwrap();
        let digest = signing_digest(&config.domain(), &payload.payload.authorization);
        assert_eq!(
            recover_signer(&digest, &payload.payload.signature.0).unwrap(),
            signer.address()
        );
    }

    #[test]
    fn test_header_encodes_and_decodes() {
        let config = test_config();
        let requirements = config.requirements();
        let signer = LocalSigner::random();

        let header =
            build_payment_header(&signer, &requirements, &config.domain()).unwrap();
        let decoded: PaymentPayload = header.decode().unwrap();
        assert_eq!(decoded.payload.authorization.from, signer.address());
    }
}
