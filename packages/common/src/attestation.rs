//! Attestation digest computation
//!
//! The verifier signs a digest binding one transfer on one bridge instance to a
//! single-use nonce. The contract recomputes the same digest from its stored
//! record, so the payload carried on chain is only the 65-byte signature.
//!
//! # Byte Layout (preimage of the digest)
//! - `"cosmic-bridge/attestation/v1"` (28 bytes)
//! - contract address length (u32, big-endian) followed by its UTF-8 bytes
//! - transfer_id (u64, big-endian)
//! - nonce (u64, big-endian)
//! - source_chain_id (u64, big-endian)
//! - dest_chain_id (u64, big-endian)
//! - token_id (u64, big-endian)
//! - amount fingerprint (32 bytes, keccak256 of the ciphertext)
//!
//! # Signature format
//! `r || s || v` (65 bytes), `v` in {0, 1, 27, 28}. The signer is identified by
//! its 20-byte EVM-style address `keccak256(uncompressed_pubkey[1..])[12..]`.

use crate::codec::keccak256;
use crate::error::CryptoError;

pub const ATTESTATION_DOMAIN: &[u8] = b"cosmic-bridge/attestation/v1";

pub const SIGNATURE_LEN: usize = 65;

/// Everything an attestation commits to.
#[derive(Clone, Debug, PartialEq)]
pub struct AttestationClaim<'a> {
    pub contract: &'a str,
    pub transfer_id: u64,
    pub nonce: u64,
    pub source_chain_id: u64,
    pub dest_chain_id: u64,
    pub token_id: u64,
    pub amount_fingerprint: [u8; 32],
}

/// Compute the digest the verifier signs.
pub fn attestation_digest(claim: &AttestationClaim) -> [u8; 32] {
    let contract = claim.contract.as_bytes();
    let mut data = Vec::with_capacity(ATTESTATION_DOMAIN.len() + 4 + contract.len() + 5 * 8 + 32);
    data.extend_from_slice(ATTESTATION_DOMAIN);
    data.extend_from_slice(&(contract.len() as u32).to_be_bytes());
    data.extend_from_slice(contract);
    data.extend_from_slice(&claim.transfer_id.to_be_bytes());
    data.extend_from_slice(&claim.nonce.to_be_bytes());
    data.extend_from_slice(&claim.source_chain_id.to_be_bytes());
    data.extend_from_slice(&claim.dest_chain_id.to_be_bytes());
    data.extend_from_slice(&claim.token_id.to_be_bytes());
    data.extend_from_slice(&claim.amount_fingerprint);
    keccak256(&data)
}

/// Reference stored on an attested transfer: keccak256(digest || r || s).
///
/// `v` is excluded so both recovery-id conventions yield the same reference.
pub fn attestation_ref(digest: &[u8; 32], signature: &[u8]) -> Result<[u8; 32], CryptoError> {
    let (rs, _) = split_signature(signature)?;
    let mut data = [0u8; 96];
    data[0..32].copy_from_slice(digest);
    data[32..96].copy_from_slice(rs);
    Ok(keccak256(&data))
}

/// Split a 65-byte signature into `r || s` and a recovery id in {0, 1}.
pub fn split_signature(signature: &[u8]) -> Result<(&[u8], u8), CryptoError> {
    if signature.len() != SIGNATURE_LEN {
        return Err(CryptoError::InvalidSignature {
            reason: format!("expected {} bytes, got {}", SIGNATURE_LEN, signature.len()),
        });
    }
    let recovery_id = match signature[64] {
        0 | 27 => 0,
        1 | 28 => 1,
        v => {
            return Err(CryptoError::InvalidSignature {
                reason: format!("unsupported recovery byte {}", v),
            })
        }
    };
    Ok((&signature[..64], recovery_id))
}

/// Derive the 20-byte address of an uncompressed (65-byte, 0x04-prefixed) public key.
pub fn evm_address_from_pubkey(pubkey: &[u8]) -> Result<[u8; 20], CryptoError> {
    if pubkey.len() != 65 || pubkey[0] != 0x04 {
        return Err(CryptoError::InvalidSignature {
            reason: "recovered key is not an uncompressed secp256k1 point".to_string(),
        });
    }
    let hash = keccak256(&pubkey[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Ok(address)
}

/// Parse a 0x-prefixed (or bare) 40-character hex address.
pub fn parse_evm_address(address: &str) -> Result<[u8; 20], CryptoError> {
    let stripped = address.strip_prefix("0x").unwrap_or(address);
    if stripped.len() != 40 {
        return Err(CryptoError::InvalidAddress {
            reason: format!("expected 40 hex characters, got {}", stripped.len()),
        });
    }
    let bytes = hex::decode(stripped).map_err(|e| CryptoError::InvalidAddress {
        reason: e.to_string(),
    })?;
    let mut result = [0u8; 20];
    result.copy_from_slice(&bytes);
    Ok(result)
}

/// Canonical lowercase 0x-prefixed form.
pub fn format_evm_address(address: &[u8; 20]) -> String {
    format!("0x{}", hex::encode(address))
}

/// Convert 32-byte hash to hex string (for attributes/logging)
pub fn bytes32_to_hex(bytes: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(bytes))
}
