//! Attestor error types

use common::CryptoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttestorError {
    #[error("{0}")]
    Crypto(#[from] CryptoError),

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Invalid signing key: {reason}")]
    SigningKey { reason: String },

    #[error("Signing failed: {reason}")]
    Signing { reason: String },

    #[error("Nonce space exhausted")]
    NonceExhausted,

    #[error("Transfer {id} has no attestation to prove (state: {state})")]
    NotAttested { id: u64, state: String },
}

impl AttestorError {
    pub fn config(reason: impl Into<String>) -> Self {
        AttestorError::Config {
            reason: reason.into(),
        }
    }
}
