//! Cosmic Bridge Attestor - Library interface
//!
//! The verifier side of the bridge: opens encrypted transfer amounts with the
//! bridge's decryption key, runs a pluggable validator and signs attestation
//! digests the contract accepts from its configured verifier.

pub mod attestor;
pub mod bounded_cache;
pub mod config;
pub mod error;
pub mod signer;
pub mod validator;

pub use attestor::{destination_proof, Attestor, Outcome, VolumeReport};
pub use config::Config;
pub use error::AttestorError;
pub use signer::AttestationSigner;
pub use validator::{AmountPolicy, TransferValidator, Verdict};

/// A transfer as returned by the bridge's `Transfer` / `Transfers` queries.
pub type TransferView = cosmic_bridge::msg::TransferResponse;
