//! Recipient identity: the spend/view key bundle.

use tracing::info;

use veilpay_core::error::Result;
use veilpay_core::types::PaymentEvent;
use veilpay_crypto::KeyPair;

use crate::discovery::{scan_event, scan_events, DiscoveredPayment, RecipientKeys, ScanOutcome, ScanStats};
use crate::meta::StealthMetaAddress;

/// A recipient's full stealth identity: the spend and view key pairs.
///
/// The spend key controls derived funds; the view key only enables
/// detection, so it can live on an always-on scanner without putting
/// funds at risk.
#[derive(Clone, Debug)]
pub struct StealthWallet {
    /// Long-term spend pair.
    pub spend: KeyPair,
    /// Long-term view pair.
    pub view: KeyPair,
}

impl StealthWallet {
    /// Generates a fresh identity with two independent key pairs.
    pub fn generate() -> Self {
        let wallet = Self {
            spend: KeyPair::generate(),
            view: KeyPair::generate(),
        };
        info!("generated new stealth wallet");
        wallet
    }

    /// Reconstructs an identity from stored private scalars.
    pub fn from_secret_bytes(spend: &[u8], view: &[u8]) -> Result<Self> {
        Ok(Self {
            spend: KeyPair::from_secret_bytes(spend)?,
            view: KeyPair::from_secret_bytes(view)?,
        })
    }

    /// The public meta-address senders pay against.
    pub fn meta_address(&self) -> StealthMetaAddress {
        StealthMetaAddress::new(self.spend.public, self.view.public)
    }

    fn recipient_keys(&self) -> RecipientKeys<'_> {
        RecipientKeys {
            spend: &self.spend,
            view_secret: &self.view.secret,
        }
    }

    /// Checks a single indexed event for ownership.
    pub fn try_discover(&self, event: &PaymentEvent) -> ScanOutcome {
        scan_event(&self.recipient_keys(), event)
    }

    /// Scans a batch of indexed events.
    pub fn scan(&self, events: &[PaymentEvent]) -> (Vec<DiscoveredPayment>, ScanStats) {
        scan_events(&self.recipient_keys(), events)
    }
}
