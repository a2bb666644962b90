//! Encrypted amount handle.
//!
//! An `EncryptedAmount` is an exponential ElGamal ciphertext `(C1, C2) = (rG, mG + rP)`
//! tagged with the context `P` it was produced under. The type deliberately
//! exposes no equality or ordering: the only operations are homomorphic
//! addition, range-proof verification (see `range_proof`) and decryption by
//! the holder of the context's secret key.

use cosmwasm_std::Binary;
use k256::elliptic_curve::rand_core::{CryptoRng, RngCore};
use k256::elliptic_curve::Field;
use k256::{ProjectivePoint, Scalar};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::codec::{decode_point, encode_point, keccak256};
use crate::error::CryptoError;
use crate::keys::EncryptionKey;

#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EncryptedAmount {
    /// Compressed encryption key the ciphertext is bound to
    context: Binary,
    c1: Binary,
    c2: Binary,
}

impl EncryptedAmount {
    /// Encrypt `value` under `key` with fresh randomness.
    pub fn encrypt<R: RngCore + CryptoRng>(value: u64, key: &EncryptionKey, rng: &mut R) -> Self {
        let randomness = Scalar::random(&mut *rng);
        Self::encrypt_with_randomness(value, key, &randomness)
    }

    pub(crate) fn encrypt_with_randomness(
        value: u64,
        key: &EncryptionKey,
        randomness: &Scalar,
    ) -> Self {
        let c1 = ProjectivePoint::GENERATOR * randomness;
        let c2 = ProjectivePoint::GENERATOR * Scalar::from(value) + key.point() * randomness;
        Self::from_points(key.to_binary(), &c1, &c2)
    }

    pub(crate) fn from_points(context: Binary, c1: &ProjectivePoint, c2: &ProjectivePoint) -> Self {
        Self {
            context,
            c1: encode_point(c1),
            c2: encode_point(c2),
        }
    }

    /// Component-wise sum of two ciphertexts; decrypts to the sum of the plaintexts.
    pub fn homomorphic_add(&self, other: &EncryptedAmount) -> Result<Self, CryptoError> {
        if self.context != other.context {
            return Err(CryptoError::ContextMismatch);
        }
        let (a1, a2) = self.points()?;
        let (b1, b2) = other.points()?;
        Ok(Self::from_points(self.context.clone(), &(a1 + b1), &(a2 + b2)))
    }

    pub fn context(&self) -> &Binary {
        &self.context
    }

    pub fn is_bound_to(&self, key: &EncryptionKey) -> bool {
        self.context == key.to_binary()
    }

    /// Structural check: the context is a usable key and both components are curve points.
    pub fn validate(&self) -> Result<(), CryptoError> {
        EncryptionKey::from_bytes(self.context.as_slice())?;
        self.points().map(|_| ())
    }

    /// keccak256(context || c1 || c2), the value attestations commit to.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut preimage =
            Vec::with_capacity(self.context.len() + self.c1.len() + self.c2.len());
        preimage.extend_from_slice(self.context.as_slice());
        preimage.extend_from_slice(self.c1.as_slice());
        preimage.extend_from_slice(self.c2.as_slice());
        keccak256(&preimage)
    }

    pub(crate) fn points(&self) -> Result<(ProjectivePoint, ProjectivePoint), CryptoError> {
        let c1 = decode_point(self.c1.as_slice(), "c1")?;
        let c2 = decode_point(self.c2.as_slice(), "c2")?;
        Ok((c1, c2))
    }
}
