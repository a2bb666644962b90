//! Attestation signing.
//!
//! Signatures are 65 bytes `r || s || v` with `v = 27 + recovery_id`, the form
//! the bridge recovers the verifier address from.

use std::fmt;

use common::{evm_address_from_pubkey, format_evm_address};
use cosmwasm_std::Binary;
use k256::ecdsa::SigningKey;
use rand::{CryptoRng, RngCore};

use crate::error::AttestorError;

pub struct AttestationSigner {
    key: SigningKey,
    address: String,
}

impl fmt::Debug for AttestationSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttestationSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl AttestationSigner {
    pub fn new(key: SigningKey) -> Result<Self, AttestorError> {
        let point = key.verifying_key().to_encoded_point(false);
        let address = evm_address_from_pubkey(point.as_bytes())?;
        Ok(Self {
            key,
            address: format_evm_address(&address),
        })
    }

    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, AttestorError> {
        Self::new(SigningKey::random(rng))
    }

    /// Parse a 32-byte hex secret, with or without `0x`.
    pub fn from_hex(secret: &str) -> Result<Self, AttestorError> {
        let bytes = hex::decode(secret.trim().trim_start_matches("0x")).map_err(|e| {
            AttestorError::SigningKey {
                reason: e.to_string(),
            }
        })?;
        let key = SigningKey::from_slice(&bytes).map_err(|e| AttestorError::SigningKey {
            reason: e.to_string(),
        })?;
        Self::new(key)
    }

    /// Lowercase 0x address the bridge must be configured with.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.key.to_bytes())
    }

    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<Binary, AttestorError> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest)
            .map_err(|e| AttestorError::Signing {
                reason: e.to_string(),
            })?;
        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(27 + recovery_id.to_byte());
        Ok(Binary::from(bytes))
    }
}
