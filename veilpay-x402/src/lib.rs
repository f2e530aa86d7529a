//! # Veilpay x402
//!
//! The payment-authorization protocol: a server answers an unpaid request
//! with signed payment requirements, the client replies with an EIP-712
//! `TransferWithAuthorization` signature carried in a base64 header, and a
//! facilitator verifies then settles the transfer on the ledger without the
//! payer ever spending gas.
//!
//! Flow:
//!
//! ```text
//! client                server                facilitator          ledger
//!   │  GET resource       │                       │                  │
//!   │────────────────────▶│ 402 + requirements    │                  │
//!   │◀────────────────────│                       │                  │
//!   │  sign authorization │                       │                  │
//!   │  X-PAYMENT header   │                       │                  │
//!   │────────────────────▶│  verify(payload)      │                  │
//!   │                     │──────────────────────▶│ balance/nonce    │
//!   │                     │                       │─────────────────▶│
//!   │                     │  settle(payload)      │ transferWithAuth │
//!   │                     │──────────────────────▶│─────────────────▶│
//!   │◀ 200 + receipt hdr ─│◀──────────────────────│◀─────────────────│
//! ```
//!
//! Verification runs a fixed sequence of checks, each with a distinct stable
//! reason code, and short-circuits at the first failure. The ledger contract
//! remains the source of truth at settlement; protocol verification exists
//! for fast, cheap rejection.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod client;
pub mod eip712;
pub mod facilitator;
pub mod requirements;
pub mod signer;
pub mod transport;
pub mod types;

pub use client::{build_payment, build_payment_at, build_payment_header};
pub use eip712::{recover_signer, signing_digest, Eip712Domain};
pub use facilitator::{
    Facilitator, PendingResolution, SettledPayment, SettlementResult, VerifyOutcome,
};
pub use requirements::{ServiceConfig, EXACT_SCHEME};
pub use signer::LocalSigner;
pub use transport::Base64Header;
pub use types::{
    AmountValue, ExactPaymentPayload, Nonce, PaymentPayload, PaymentRequiredResponse,
    PaymentRequirements, SettlementResponse, SignatureBytes, TransferAuthorization,
    X402_VERSION,
};
