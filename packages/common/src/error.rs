//! Error types for the shared crypto primitives

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CryptoError {
    // ========================================================================
    // Encoding Errors
    // ========================================================================

    #[error("Invalid curve point in {field}")]
    InvalidPoint { field: &'static str },

    #[error("Invalid scalar in {field}")]
    InvalidScalar { field: &'static str },

    #[error("Invalid encryption key: {reason}")]
    InvalidKey { reason: String },

    // ========================================================================
    // Ciphertext Errors
    // ========================================================================

    #[error("Encryption context mismatch")]
    ContextMismatch,

    #[error("Value {value} is outside the declared range")]
    ValueOutOfRange { value: u64 },

    #[error("Ciphertext does not decrypt to a value below {bound}")]
    DecryptionOutOfBound { bound: u64 },

    // ========================================================================
    // Proof Errors
    // ========================================================================

    #[error("Invalid range proof: {reason}")]
    InvalidRangeProof { reason: String },

    // ========================================================================
    // Attestation Errors
    // ========================================================================

    #[error("Invalid address: {reason}")]
    InvalidAddress { reason: String },

    #[error("Invalid signature: {reason}")]
    InvalidSignature { reason: String },
}
