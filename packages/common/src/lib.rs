//! Common - Shared Types for Cosmic Bridge
//!
//! Used by the bridge contract (verification side) and by the off-chain
//! attestor and wallet tooling (encryption, proving, signing side).
//!
//! - `amount` - the opaque encrypted amount handle (exponential ElGamal on secp256k1)
//! - `keys` - encryption context and the verifier's decryption key
//! - `range_proof` - bound-check proofs verifiable without decryption
//! - `attestation` - digest and reference format for verifier attestations

pub mod amount;
pub mod attestation;
mod codec;
pub mod error;
pub mod keys;
pub mod range_proof;

pub use amount::EncryptedAmount;
pub use attestation::{
    attestation_digest, attestation_ref, bytes32_to_hex, evm_address_from_pubkey,
    format_evm_address, parse_evm_address, split_signature, AttestationClaim,
};
pub use codec::keccak256;
pub use error::CryptoError;
pub use keys::{DecryptionKey, EncryptionKey};
pub use range_proof::{attach_proof, encrypt_with_proof, ProvenAmount, RangeProof};
