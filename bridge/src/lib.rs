//! Cosmic Bridge Contract - Verifier-Attested Transfers with Encrypted Amounts
//!
//! A user locks an intent whose amount is an ElGamal ciphertext under the
//! bridge's encryption key. Observers never see the amount; only the verifier,
//! holding the matching secret, can open it.
//!
//! # Transfer Flow
//! 1. User calls `CreateTransfer` with an encrypted amount and a range proof
//! 2. The verifier observes the pending transfer, validates it off chain and
//!    signs the attestation digest
//! 3. Anyone relays `SubmitAttestation`; the contract recovers the signer,
//!    consumes the nonce and marks the transfer Attested
//! 4. `Release` with a destination proof referencing the same attestation
//!    marks it Released
//!
//! Pending transfers past their TTL can be expired by anyone, and the sender
//! can cancel while Pending.
//!
//! # Security
//! - Single authorized signer, rotatable by the owner
//! - Global nonce window survives verifier rotation
//! - Range proofs checked on chain without decryption
//! - Append-only audit log mirrored by typed events

mod audit;
pub mod contract;
pub mod error;
mod execute;
pub mod msg;
mod query;
pub mod state;

pub use crate::error::ContractError;
