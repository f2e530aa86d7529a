//! # Veilpay Store
//!
//! Storage backends for [`veilpay_core::PaymentStore`]. Currently one
//! implementation: a thread-safe in-memory store for development, testing,
//! and single-process deployments. Any durable engine with
//! upsert-by-unique-key semantics can implement the same trait.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod memory;

pub use memory::MemoryStore;
