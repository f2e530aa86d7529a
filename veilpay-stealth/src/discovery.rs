//! Payment detection and key recovery (recipient side).
//!
//! [`check_payment`] is the scan primitive: run once per observed payment
//! event to decide ownership. False negatives are zero for correctly formed
//! inputs; false positives require a keccak/address collision.

use k256::PublicKey;
use subtle::ConstantTimeEq;
use tracing::{debug, instrument};

use veilpay_core::error::{Result, VeilpayError};
use veilpay_core::types::{EthAddress, PaymentEvent};
use veilpay_crypto::{
    hash_to_scalar, mul_base, parse_public_key, point_add, public_key_to_address, scalar_mul,
    xy_bytes, KeyPair, SecretScalar,
};

// ═══════════════════════════════════════════════════════════════════════════════
// SCAN PRIMITIVES
// ═══════════════════════════════════════════════════════════════════════════════

/// Recomputes the shared point from the recipient's side and hashes it.
///
/// `v·R == r·V` by ECDH symmetry, so both sides derive the same `h`.
fn shared_hash(view_secret: &SecretScalar, ephemeral_pub: &PublicKey) -> Result<k256::Scalar> {
    let shared = scalar_mul(ephemeral_pub, &view_secret.as_scalar())?;
    Ok(hash_to_scalar(&xy_bytes(&shared)))
}

/// Decides whether a payment at `candidate` belongs to the key holder.
///
/// Recomputes `P' = S + H(v·R)·G` and compares its address to the candidate
/// in constant time. The ephemeral key may be in either accepted encoding
/// (65-byte prefixed or bare 64-byte).
///
/// # Errors
/// Malformed key material fails closed with `InvalidKeyMaterial`; it is a
/// caller decision whether that means "not ours" or "event corrupt".
pub fn check_payment(
    view_secret: &SecretScalar,
    spend_pub: &PublicKey,
    ephemeral_pub: &[u8],
    candidate: &EthAddress,
) -> Result<bool> {
    let ephemeral = parse_public_key(ephemeral_pub)?;
    let h = shared_hash(view_secret, &ephemeral)?;
    let derived = public_key_to_address(&point_add(spend_pub, &mul_base(&h)?)?);

    Ok(derived.as_bytes().ct_eq(candidate.as_bytes()).into())
}

/// [`check_payment`] against a hex-string candidate.
///
/// The compare is case-insensitive; an unparseable candidate is simply not
/// a match.
pub fn check_payment_hex(
    view_secret: &SecretScalar,
    spend_pub: &PublicKey,
    ephemeral_pub: &[u8],
    candidate: &str,
) -> Result<bool> {
    let ephemeral = parse_public_key(ephemeral_pub)?;
    let h = shared_hash(view_secret, &ephemeral)?;
    let derived = public_key_to_address(&point_add(spend_pub, &mul_base(&h)?)?);
    Ok(derived.eq_ignore_case(candidate))
}

/// Recovers the spendable private key for a detected payment.
///
/// Returns `(s + h) mod n`, whose public point equals the `P` the sender
/// derived — the core correctness property of the scheme.
pub fn derive_stealth_private_key(
    spend_secret: &SecretScalar,
    view_secret: &SecretScalar,
    ephemeral_pub: &[u8],
) -> Result<SecretScalar> {
    let ephemeral = parse_public_key(ephemeral_pub)?;
    let h = shared_hash(view_secret, &ephemeral)?;
    SecretScalar::from_scalar(spend_secret.as_scalar() + h)
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT SCANNING
// ═══════════════════════════════════════════════════════════════════════════════

/// A payment event detected as ours, with the recovered spending key.
#[derive(Debug)]
pub struct DiscoveredPayment {
    /// The detected event.
    pub event: PaymentEvent,
    /// Private key controlling the event's stealth address (zeroized on drop).
    pub stealth_private_key: SecretScalar,
}

/// Result of scanning a single payment event.
#[derive(Debug)]
pub enum ScanOutcome {
    /// Address does not derive from our keys — someone else's payment.
    NotForUs,
    /// Detection succeeded and the spending key was recovered.
    Discovered(DiscoveredPayment),
    /// The event's ephemeral key failed to parse; counted, not fatal.
    MalformedEphemeralKey(VeilpayError),
}

impl ScanOutcome {
    /// Returns true if a payment was discovered.
    pub fn is_discovered(&self) -> bool {
        matches!(self, ScanOutcome::Discovered(_))
    }
}

/// Statistics for a scan pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScanStats {
    /// Total events scanned.
    pub total_scanned: u64,
    /// Payments discovered.
    pub discoveries: u64,
    /// Events with malformed ephemeral keys.
    pub errors: u64,
}

impl ScanStats {
    /// Records one scan outcome.
    pub fn record(&mut self, outcome: &ScanOutcome) {
        self.total_scanned += 1;
        match outcome {
            ScanOutcome::Discovered(_) => self.discoveries += 1,
            ScanOutcome::MalformedEphemeralKey(_) => self.errors += 1,
            ScanOutcome::NotForUs => {}
        }
    }
}

/// Scans a single event for ownership, recovering the key on a match.
pub fn scan_event(keys: &RecipientKeys<'_>, event: &PaymentEvent) -> ScanOutcome {
    let matched = match check_payment(
        keys.view_secret,
        &keys.spend.public,
        &event.ephemeral_pubkey,
        &event.stealth_address,
    ) {
        Ok(m) => m,
        Err(e) => return ScanOutcome::MalformedEphemeralKey(e),
    };

    if !matched {
        return ScanOutcome::NotForUs;
    }

    match derive_stealth_private_key(&keys.spend.secret, keys.view_secret, &event.ephemeral_pubkey)
    {
        Ok(stealth_private_key) => ScanOutcome::Discovered(DiscoveredPayment {
            event: event.clone(),
            stealth_private_key,
        }),
        Err(e) => ScanOutcome::MalformedEphemeralKey(e),
    }
}

/// The recipient-side key material needed for scanning.
#[derive(Clone, Copy)]
pub struct RecipientKeys<'a> {
    /// The long-term spend pair (public for detection, secret for recovery).
    pub spend: &'a KeyPair,
    /// The view private key.
    pub view_secret: &'a SecretScalar,
}

/// Scans a batch of indexed events, returning discoveries and counters.
#[instrument(skip(keys, events), fields(events = events.len()))]
pub fn scan_events(
    keys: &RecipientKeys<'_>,
    events: &[PaymentEvent],
) -> (Vec<DiscoveredPayment>, ScanStats) {
    let mut discoveries = Vec::new();
    let mut stats = ScanStats::default();

    for event in events {
        let outcome = scan_event(keys, event);
        stats.record(&outcome);
        if let ScanOutcome::Discovered(payment) = outcome {
            debug!(tx_hash = %payment.event.tx_hash, "payment discovered");
            discoveries.push(payment);
        }
    }

    (discoveries, stats)
}
