//! Range proofs for encrypted amounts.
//!
//! A proof shows that an `EncryptedAmount` under context `P` hides a value in
//! `[min, min + 2^bits - 1]` without revealing it. The prover splits
//! `m - min` into bits and encrypts each bit as `(A_i, B_i) = (r_i G, b_i G + r_i P)`
//! with `r = sum(2^i * r_i)`, so the weighted bit ciphertexts add up to the
//! amount ciphertext shifted by `min`. Each bit carries a Chaum-Pedersen
//! OR-proof that `(A_i, B_i)` encrypts either 0 or 1; challenges come from a
//! keccak256 Fiat-Shamir transcript.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Binary;
use k256::elliptic_curve::rand_core::{CryptoRng, RngCore};
use k256::elliptic_curve::Field;
use k256::{ProjectivePoint, Scalar};

use crate::amount::EncryptedAmount;
use crate::codec::{decode_point, decode_scalar, encode_point, encode_scalar, Transcript};
use crate::error::CryptoError;
use crate::keys::EncryptionKey;

const RANGE_PROOF_DOMAIN: &[u8] = b"cosmic-bridge/range-proof/v1";

/// Largest supported bit width; the declared range must fit in a u64.
pub const MAX_RANGE_BITS: u8 = 64;

/// Encrypted bit plus its OR-proof.
#[cw_serde]
pub struct BitProof {
    pub c1: Binary,
    pub c2: Binary,
    pub e0: Binary,
    pub z0: Binary,
    pub e1: Binary,
    pub z1: Binary,
}

#[cw_serde]
pub struct RangeProof {
    /// Lower bound of the declared range
    pub min: u64,
    /// Width of the range in bits; the upper bound is `min + 2^bits - 1`
    pub bits: u8,
    pub bit_proofs: Vec<BitProof>,
}

fn invalid(reason: impl Into<String>) -> CryptoError {
    CryptoError::InvalidRangeProof {
        reason: reason.into(),
    }
}

fn range_max(min: u64, bits: u8) -> Result<u64, CryptoError> {
    if bits == 0 || bits > MAX_RANGE_BITS {
        return Err(invalid(format!("bits must be between 1 and {}", MAX_RANGE_BITS)));
    }
    let span = if bits == 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    };
    min.checked_add(span)
        .ok_or_else(|| invalid("declared range overflows u64"))
}

fn weight(index: usize) -> Scalar {
    Scalar::from(1u64 << index)
}

fn base_transcript(
    key: &EncryptionKey,
    c1: &ProjectivePoint,
    c2: &ProjectivePoint,
    min: u64,
    bits: u8,
) -> Transcript {
    let mut transcript = Transcript::new(RANGE_PROOF_DOMAIN);
    transcript.append_point(b"context", &key.point());
    transcript.append_point(b"c1", c1);
    transcript.append_point(b"c2", c2);
    transcript.append_u64(b"min", min);
    transcript.append_u64(b"bits", bits as u64);
    transcript
}

/// Statement commitments for one bit: `T_j = (z_j G - e_j A, z_j P - e_j D_j)`
/// where `D_0 = B` and `D_1 = B - G`.
fn bit_challenge(
    base: &Transcript,
    index: usize,
    a: &ProjectivePoint,
    b: &ProjectivePoint,
    t0: (&ProjectivePoint, &ProjectivePoint),
    t1: (&ProjectivePoint, &ProjectivePoint),
) -> Scalar {
    let mut transcript = base.clone();
    transcript.append_u64(b"index", index as u64);
    transcript.append_point(b"a", a);
    transcript.append_point(b"b", b);
    transcript.append_point(b"t0g", t0.0);
    transcript.append_point(b"t0p", t0.1);
    transcript.append_point(b"t1g", t1.0);
    transcript.append_point(b"t1p", t1.1);
    transcript.challenge()
}

impl RangeProof {
    /// Upper bound of the declared range.
    pub fn max(&self) -> Result<u64, CryptoError> {
        range_max(self.min, self.bits)
    }

    /// Check the proof against `amount` without decrypting it.
    pub fn verify(&self, amount: &EncryptedAmount) -> Result<(), CryptoError> {
        range_max(self.min, self.bits)?;
        if self.bit_proofs.len() != self.bits as usize {
            return Err(invalid(format!(
                "expected {} bit proofs, got {}",
                self.bits,
                self.bit_proofs.len()
            )));
        }

        let key = EncryptionKey::from_bytes(amount.context().as_slice())?;
        let p = key.point();
        let g = ProjectivePoint::GENERATOR;
        let (c1, c2) = amount.points()?;
        let base = base_transcript(&key, &c1, &c2, self.min, self.bits);

        let mut sum_a = ProjectivePoint::IDENTITY;
        let mut sum_b = ProjectivePoint::IDENTITY;
        for (index, bit) in self.bit_proofs.iter().enumerate() {
            let a = decode_point(bit.c1.as_slice(), "bit_proofs.c1")?;
            let b = decode_point(bit.c2.as_slice(), "bit_proofs.c2")?;
            let e0 = decode_scalar(bit.e0.as_slice(), "bit_proofs.e0")?;
            let z0 = decode_scalar(bit.z0.as_slice(), "bit_proofs.z0")?;
            let e1 = decode_scalar(bit.e1.as_slice(), "bit_proofs.e1")?;
            let z1 = decode_scalar(bit.z1.as_slice(), "bit_proofs.z1")?;

            let d0 = b;
            let d1 = b - g;
            let t0 = (g * z0 - a * e0, p * z0 - d0 * e0);
            let t1 = (g * z1 - a * e1, p * z1 - d1 * e1);
            let challenge = bit_challenge(&base, index, &a, &b, (&t0.0, &t0.1), (&t1.0, &t1.1));
            if e0 + e1 != challenge {
                return Err(invalid(format!("bit {} is not a 0/1 encryption", index)));
            }

            let w = weight(index);
            sum_a += a * w;
            sum_b += b * w;
        }

        if sum_a != c1 {
            return Err(invalid("bit randomness does not match ciphertext"));
        }
        if sum_b != c2 - g * Scalar::from(self.min) {
            return Err(invalid("bit values do not match ciphertext"));
        }
        Ok(())
    }
}

/// Encrypt `value` and prove it lies in `[min, min + 2^bits - 1]`.
pub fn encrypt_with_proof<R: RngCore + CryptoRng>(
    value: u64,
    min: u64,
    bits: u8,
    key: &EncryptionKey,
    rng: &mut R,
) -> Result<(EncryptedAmount, RangeProof), CryptoError> {
    let max = range_max(min, bits)?;
    if value < min || value > max {
        return Err(CryptoError::ValueOutOfRange { value });
    }
    let shifted = value - min;
    let g = ProjectivePoint::GENERATOR;
    let p = key.point();

    let mut randomness = Vec::with_capacity(bits as usize);
    let mut total = Scalar::ZERO;
    for index in 0..bits as usize {
        let r = Scalar::random(&mut *rng);
        total += r * weight(index);
        randomness.push(r);
    }

    let amount = EncryptedAmount::encrypt_with_randomness(value, key, &total);
    let (c1, c2) = amount.points()?;
    let base = base_transcript(key, &c1, &c2, min, bits);

    let mut bit_proofs = Vec::with_capacity(bits as usize);
    for (index, r) in randomness.iter().enumerate() {
        let bit = (shifted >> index) & 1 == 1;
        let a = g * r;
        let b = if bit { g + p * r } else { p * r };
        let d = [b, b - g];

        // Simulate the false statement, prove the true one honestly.
        let real = bit as usize;
        let fake = 1 - real;
        let e_fake = Scalar::random(&mut *rng);
        let z_fake = Scalar::random(&mut *rng);
        let k = Scalar::random(&mut *rng);

        let mut t = [(ProjectivePoint::IDENTITY, ProjectivePoint::IDENTITY); 2];
        t[fake] = (g * z_fake - a * e_fake, p * z_fake - d[fake] * e_fake);
        t[real] = (g * k, p * k);

        let challenge = bit_challenge(&base, index, &a, &b, (&t[0].0, &t[0].1), (&t[1].0, &t[1].1));
        let e_real = challenge - e_fake;
        let z_real = k + e_real * r;

        let mut e = [Scalar::ZERO; 2];
        let mut z = [Scalar::ZERO; 2];
        e[fake] = e_fake;
        z[fake] = z_fake;
        e[real] = e_real;
        z[real] = z_real;

        bit_proofs.push(BitProof {
            c1: encode_point(&a),
            c2: encode_point(&b),
            e0: encode_scalar(&e[0]),
            z0: encode_scalar(&z[0]),
            e1: encode_scalar(&e[1]),
            z1: encode_scalar(&z[1]),
        });
    }

    Ok((
        amount,
        RangeProof {
            min,
            bits,
            bit_proofs,
        },
    ))
}

/// An encrypted amount whose range proof has been checked.
///
/// Only constructible through [`attach_proof`].
#[derive(Clone, Debug)]
pub struct ProvenAmount {
    amount: EncryptedAmount,
    min: u64,
    max: u64,
    bits: u8,
}

impl ProvenAmount {
    pub fn amount(&self) -> &EncryptedAmount {
        &self.amount
    }

    pub fn into_amount(self) -> EncryptedAmount {
        self.amount
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }
}

/// Verify `proof` against `amount` and bind them together.
pub fn attach_proof(
    amount: EncryptedAmount,
    proof: &RangeProof,
) -> Result<ProvenAmount, CryptoError> {
    proof.verify(&amount)?;
    Ok(ProvenAmount {
        amount,
        min: proof.min,
        max: proof.max()?,
        bits: proof.bits,
    })
}
