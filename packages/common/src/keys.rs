//! Encryption context and verifier decryption key.
//!
//! A bridge instance has exactly one encryption context: the public key `P = xG`
//! every transfer amount is encrypted under. The matching secret `x` is held
//! only by the verifier, which is the single party allowed to open amounts.

use std::collections::HashMap;
use std::fmt;

use cosmwasm_std::Binary;
use k256::elliptic_curve::group::GroupEncoding;
use k256::elliptic_curve::rand_core::{CryptoRng, RngCore};
use k256::elliptic_curve::Field;
use k256::{ProjectivePoint, Scalar};

use crate::amount::EncryptedAmount;
use crate::codec::{decode_point, decode_scalar, encode_point};
use crate::error::CryptoError;

/// Public encryption context of a bridge instance.
#[derive(Clone, Debug, PartialEq)]
pub struct EncryptionKey {
    point: ProjectivePoint,
}

impl EncryptionKey {
    /// Parse a compressed SEC1 public key. The identity point is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let point = decode_point(bytes, "encryption_key").map_err(|_| CryptoError::InvalidKey {
            reason: format!("expected 33-byte compressed point, got {} bytes", bytes.len()),
        })?;
        if point == ProjectivePoint::IDENTITY {
            return Err(CryptoError::InvalidKey {
                reason: "identity point".to_string(),
            });
        }
        Ok(Self { point })
    }

    pub fn to_binary(&self) -> Binary {
        encode_point(&self.point)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.point.to_bytes())
    }

    pub(crate) fn point(&self) -> ProjectivePoint {
        self.point
    }
}

/// Verifier-held decryption key.
///
/// `Debug` never prints the secret scalar.
#[derive(Clone)]
pub struct DecryptionKey {
    secret: Scalar,
    public: EncryptionKey,
}

impl fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptionKey")
            .field("secret", &"<redacted>")
            .field("public", &self.public.to_hex())
            .finish()
    }
}

impl DecryptionKey {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        loop {
            let secret = Scalar::random(&mut *rng);
            if !bool::from(secret.is_zero()) {
                return Self::from_scalar(secret);
            }
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let secret = decode_scalar(bytes, "decryption_key")?;
        if bool::from(secret.is_zero()) {
            return Err(CryptoError::InvalidScalar {
                field: "decryption_key",
            });
        }
        Ok(Self::from_scalar(secret))
    }

    fn from_scalar(secret: Scalar) -> Self {
        let public = EncryptionKey {
            point: ProjectivePoint::GENERATOR * secret,
        };
        Self { secret, public }
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes().into()
    }

    pub fn encryption_key(&self) -> &EncryptionKey {
        &self.public
    }

    /// Open an amount whose plaintext is known to lie in `[0, bound)`.
    ///
    /// Recovers `mG = C2 - x*C1` and solves the discrete log with a
    /// baby-step giant-step search, so cost grows with `sqrt(bound)`.
    pub fn decrypt(&self, amount: &EncryptedAmount, bound: u64) -> Result<u64, CryptoError> {
        if !amount.is_bound_to(&self.public) {
            return Err(CryptoError::ContextMismatch);
        }
        if bound == 0 {
            return Err(CryptoError::DecryptionOutOfBound { bound });
        }
        let (c1, c2) = amount.points()?;
        let target = c2 - c1 * self.secret;
        discrete_log(target, bound).ok_or(CryptoError::DecryptionOutOfBound { bound })
    }
}

fn discrete_log(target: ProjectivePoint, bound: u64) -> Option<u64> {
    let mut step = (bound as f64).sqrt() as u64;
    while (step as u128) * (step as u128) < bound as u128 {
        step += 1;
    }

    let mut baby_steps = HashMap::with_capacity(step as usize);
    let mut point = ProjectivePoint::IDENTITY;
    for j in 0..step {
        baby_steps.entry(point.to_bytes()).or_insert(j);
        point += ProjectivePoint::GENERATOR;
    }

    let giant = ProjectivePoint::GENERATOR * Scalar::from(step);
    let mut current = target;
    for i in 0..step {
        if let Some(j) = baby_steps.get(&current.to_bytes()) {
            let value = (i as u128) * (step as u128) + *j as u128;
            return (value < bound as u128).then_some(value as u64);
        }
        current -= giant;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_encryption_key_rejects_identity() {
        let err = EncryptionKey::from_bytes(&[0u8; 33]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKey { .. }));
    }

    #[test]
    fn test_decryption_key_bytes_roundtrip() {
        let mut rng = StdRng::seed_from_u64(7);
        let key = DecryptionKey::generate(&mut rng);
        let restored = DecryptionKey::from_bytes(&key.to_bytes()).unwrap();
        assert_eq!(restored.encryption_key(), key.encryption_key());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let mut rng = StdRng::seed_from_u64(8);
        let key = DecryptionKey::generate(&mut rng);
        let printed = format!("{:?}", key);
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains(&hex::encode(key.to_bytes())));
    }

    #[test]
    fn test_decrypt_small_values() {
        let mut rng = StdRng::seed_from_u64(9);
        let key = DecryptionKey::generate(&mut rng);
        for value in [0u64, 1, 2, 999, 4095] {
            let amount = EncryptedAmount::encrypt(value, key.encryption_key(), &mut rng);
            assert_eq!(key.decrypt(&amount, 4096).unwrap(), value);
        }
    }

    #[test]
    fn test_decrypt_outside_bound_fails() {
        let mut rng = StdRng::seed_from_u64(10);
        let key = DecryptionKey::generate(&mut rng);
        let amount = EncryptedAmount::encrypt(5000, key.encryption_key(), &mut rng);
        assert_eq!(
            key.decrypt(&amount, 4096),
            Err(CryptoError::DecryptionOutOfBound { bound: 4096 })
        );
    }

    #[test]
    fn test_decrypt_rejects_foreign_context() {
        let mut rng = StdRng::seed_from_u64(11);
        let key = DecryptionKey::generate(&mut rng);
        let other = DecryptionKey::generate(&mut rng);
        let amount = EncryptedAmount::encrypt(1, other.encryption_key(), &mut rng);
        assert_eq!(key.decrypt(&amount, 16), Err(CryptoError::ContextMismatch));
    }
}
