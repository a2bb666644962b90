//! Execute handlers for the Cosmic Bridge contract.
//!
//! This module contains all execute message handlers, organized by category:
//! - `registry` - Chain and token registration and enable/disable toggles
//! - `transfer` - Transfer ledger: create, release, expire, cancel
//! - `attestation` - Verifier gateway (signature recovery, nonce window)
//! - `admin` - Ownership, verifier rotation and policy

mod admin;
mod attestation;
mod registry;
mod transfer;

pub use admin::*;
pub use attestation::*;
pub use registry::*;
pub use transfer::*;

pub(crate) use attestation::digest_for;
pub(crate) use admin::{normalize_verifier, validate_amount_bits, validate_ttl};
pub(crate) use registry::{default_chains, default_tokens, register_chain, register_token};
