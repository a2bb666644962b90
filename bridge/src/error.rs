//! Error types for the Cosmic Bridge contract
//!
//! Grouped as validation (bad reference, disabled entity, malformed proof),
//! authorization (wrong caller or signer) and state conflict (wrong state,
//! deadline, replayed nonce). Every error aborts the message, so no partial
//! write survives a rejection.

use common::CryptoError;
use cosmwasm_std::{StdError, Timestamp};
use thiserror::Error;

use crate::state::TransferState;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Crypto(#[from] CryptoError),

    // ========================================================================
    // Validation Errors
    // ========================================================================

    #[error("{kind} {id} not found")]
    NotFound { kind: String, id: u64 },

    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: String, id: u64 },

    #[error("Invalid chain ID: {chain_id}")]
    InvalidChainId { chain_id: u64 },

    #[error("Invalid token ID: {token_id}")]
    InvalidTokenId { token_id: u64 },

    #[error("Invalid decimals: {decimals} (max 18)")]
    InvalidDecimals { decimals: u8 },

    #[error("Chain {chain_id} is disabled")]
    ChainDisabled { chain_id: u64 },

    #[error("Token {token_id} is disabled")]
    TokenDisabled { token_id: u64 },

    #[error("Source and destination chain are both {chain_id}")]
    SameChain { chain_id: u64 },

    #[error("Empty field: {field}")]
    EmptyField { field: String },

    #[error("Invalid range proof: {reason}")]
    InvalidRangeProof { reason: String },

    #[error("Encrypted amount is not bound to this bridge's encryption key")]
    ContextMismatch,

    #[error("Invalid signature: {reason}")]
    InvalidSignature { reason: String },

    #[error("Invalid verifier address: {reason}")]
    InvalidVerifierAddress { reason: String },

    #[error("Invalid encryption key: {reason}")]
    InvalidEncryptionKey { reason: String },

    #[error("Invalid transfer TTL: {seconds} seconds (max {max})")]
    InvalidTtl { seconds: u64, max: u64 },

    #[error("Invalid amount bits: {bits} (must be 1-64)")]
    InvalidAmountBits { bits: u8 },

    // ========================================================================
    // Authorization Errors
    // ========================================================================

    #[error("Unauthorized: only owner can perform this action")]
    Unauthorized,

    #[error("Unauthorized: attestation signed by {signer}, not the verifier")]
    UnauthorizedVerifier { signer: String },

    #[error("Unauthorized: only the transfer sender can cancel")]
    NotSender,

    // ========================================================================
    // State Conflict Errors
    // ========================================================================

    #[error("Transfer {id} is not pending (state: {state})")]
    NotPending { id: u64, state: TransferState },

    #[error("Transfer {id} is not attested (state: {state})")]
    NotAttested { id: u64, state: TransferState },

    #[error("Transfer {id} expired at {expired_at}")]
    Expired { id: u64, expired_at: Timestamp },

    #[error("Transfer {id} does not expire until {expires_at}")]
    NotExpired { id: u64, expires_at: Timestamp },

    #[error("Attestation nonce already used: {nonce}")]
    ReplayedNonce { nonce: u64 },

    #[error("Destination proof does not match attestation of transfer {id}")]
    ProofMismatch { id: u64 },
}

impl ContractError {
    pub fn not_found(kind: &str, id: u64) -> Self {
        ContractError::NotFound {
            kind: kind.to_string(),
            id,
        }
    }

    pub fn already_exists(kind: &str, id: u64) -> Self {
        ContractError::AlreadyExists {
            kind: kind.to_string(),
            id,
        }
    }
}
