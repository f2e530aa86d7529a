//! Server-side payment requirements, built from static service config.

use serde_json::json;

use veilpay_core::types::EthAddress;

use crate::eip712::Eip712Domain;
use crate::types::{
    AmountValue, PaymentRequiredResponse, PaymentRequirements, X402_VERSION,
};

/// Scheme name of the only supported payment scheme.
pub const EXACT_SCHEME: &str = "exact";

/// Static configuration of one paid service endpoint.
///
/// Everything a server needs to issue challenges and a facilitator needs to
/// verify authorizations against them.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Network identifier, e.g. `"base-sepolia"`.
    pub network: String,
    /// Chain id matching `network`.
    pub chain_id: u64,
    /// Token contract used for payment.
    pub asset: EthAddress,
    /// Token EIP-712 name, e.g. `"USD Coin"`.
    pub asset_name: String,
    /// Token EIP-712 version, e.g. `"2"`.
    pub asset_version: String,
    /// Address payments must be made to.
    pub pay_to: EthAddress,
    /// Price of the resource, smallest units.
    pub price: u128,
    /// Resource URL.
    pub resource: String,
    /// Resource description shown to payers.
    pub description: String,
    /// Resource MIME type.
    pub mime_type: String,
    /// Seconds a client has to complete payment.
    pub max_timeout_seconds: u64,
}

impl ServiceConfig {
    /// The EIP-712 domain authorizations for this service sign under.
    pub fn domain(&self) -> Eip712Domain {
        Eip712Domain {
            name: self.asset_name.clone(),
            version: self.asset_version.clone(),
            chain_id: self.chain_id,
            verifying_contract: self.asset,
        }
    }

    /// Builds the requirements entry for this service.
    ///
    /// Pure construction; issuing a challenge twice yields the same
    /// requirements and touches no state.
    pub fn requirements(&self) -> PaymentRequirements {
        PaymentRequirements {
            scheme: EXACT_SCHEME.into(),
            network: self.network.clone(),
            max_amount_required: AmountValue(self.price),
            resource: self.resource.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
            pay_to: self.pay_to,
            max_timeout_seconds: self.max_timeout_seconds,
            asset: self.asset,
            extra: Some(json!({
                "name": self.asset_name,
                "version": self.asset_version,
            })),
        }
    }

    /// Builds the full 402-style challenge body.
    pub fn payment_required(&self, error: impl Into<String>) -> PaymentRequiredResponse {
        PaymentRequiredResponse {
            x402_version: X402_VERSION,
            error: error.into(),
            accepts: vec![self.requirements()],
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_config() -> ServiceConfig {
        ServiceConfig {
            network: "base-sepolia".into(),
            chain_id: 84532,
            asset: EthAddress::from_array([0x44; 20]),
            asset_name: "USD Coin".into(),
            asset_version: "2".into(),
            pay_to: EthAddress::from_array([0x33; 20]),
            price: 250_000,
            resource: "https://api.example.com/premium".into(),
            description: "Premium market feed".into(),
            mime_type: "application/json".into(),
            max_timeout_seconds: 300,
        }
    }

    #[test]
    fn test_challenge_is_idempotent() {
        let config = test_config();
        let a = config.payment_required("payment required");
        let b = config.payment_required("payment required");
        assert_eq!(a, b);
        assert_eq!(a.x402_version, X402_VERSION);
        assert_eq!(a.accepts.len(), 1);
    }

    #[test]
    fn test_requirements_carry_domain_metadata() {
        let requirements = test_config().requirements();
        let extra = requirements.extra.unwrap();
        assert_eq!(extra["name"], "USD Coin");
        assert_eq!(extra["version"], "2");
        assert_eq!(requirements.scheme, EXACT_SCHEME);
    }

    #[test]
    fn test_domain_binds_asset_contract() {
        let config = test_config();
        assert_eq!(config.domain().verifying_contract, config.asset);
        assert_eq!(config.domain().chain_id, 84532);
    }
}
