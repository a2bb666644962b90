//! Byte encodings for curve points and scalars, plus keccak hashing.
//!
//! Points are SEC1 compressed (33 bytes, all-zero for the identity).
//! Scalars are 32-byte big-endian and must be canonical (below the group order).

use cosmwasm_std::Binary;
use k256::elliptic_curve::bigint::U256;
use k256::elliptic_curve::group::GroupEncoding;
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, ProjectivePoint, Scalar};
use tiny_keccak::{Hasher, Keccak};

use crate::error::CryptoError;

pub const POINT_LEN: usize = 33;
pub const SCALAR_LEN: usize = 32;

/// Compute keccak256 hash of arbitrary data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

pub(crate) fn encode_point(point: &ProjectivePoint) -> Binary {
    Binary::from(point.to_bytes().as_slice().to_vec())
}

pub(crate) fn decode_point(
    bytes: &[u8],
    field: &'static str,
) -> Result<ProjectivePoint, CryptoError> {
    if bytes.len() != POINT_LEN {
        return Err(CryptoError::InvalidPoint { field });
    }
    let mut repr = <ProjectivePoint as GroupEncoding>::Repr::default();
    AsMut::<[u8]>::as_mut(&mut repr).copy_from_slice(bytes);
    Option::<ProjectivePoint>::from(ProjectivePoint::from_bytes(&repr))
        .ok_or(CryptoError::InvalidPoint { field })
}

pub(crate) fn encode_scalar(scalar: &Scalar) -> Binary {
    Binary::from(scalar.to_bytes().to_vec())
}

pub(crate) fn decode_scalar(bytes: &[u8], field: &'static str) -> Result<Scalar, CryptoError> {
    if bytes.len() != SCALAR_LEN {
        return Err(CryptoError::InvalidScalar { field });
    }
    let repr = FieldBytes::clone_from_slice(bytes);
    Option::<Scalar>::from(Scalar::from_repr(repr)).ok_or(CryptoError::InvalidScalar { field })
}

/// Fiat-Shamir transcript over keccak256.
///
/// Every appended item is length-prefixed so distinct item sequences never
/// hash to the same preimage.
#[derive(Clone)]
pub(crate) struct Transcript {
    hasher: Keccak,
}

impl Transcript {
    pub fn new(domain: &[u8]) -> Self {
        let mut transcript = Self {
            hasher: Keccak::v256(),
        };
        transcript.append(b"domain", domain);
        transcript
    }

    pub fn append(&mut self, label: &[u8], bytes: &[u8]) {
        self.hasher.update(&(label.len() as u32).to_be_bytes());
        self.hasher.update(label);
        self.hasher.update(&(bytes.len() as u32).to_be_bytes());
        self.hasher.update(bytes);
    }

    pub fn append_point(&mut self, label: &[u8], point: &ProjectivePoint) {
        self.append(label, point.to_bytes().as_slice());
    }

    pub fn append_u64(&mut self, label: &[u8], value: u64) {
        self.append(label, &value.to_be_bytes());
    }

    /// Challenge scalar derived from everything appended so far.
    pub fn challenge(self) -> Scalar {
        let mut output = [0u8; 32];
        self.hasher.finalize(&mut output);
        <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::clone_from_slice(&output))
    }
}
