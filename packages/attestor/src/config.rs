//! Attestor configuration

use std::env;
use std::fmt;

use crate::error::AttestorError;

/// Largest decryption bound accepted, as a power of two. Decryption cost grows
/// with the square root of the bound.
pub const MAX_DECRYPT_BOUND_BITS: u8 = 48;

/// Attestor configuration
#[derive(Clone)]
pub struct Config {
    /// Hex-encoded secp256k1 key the verifier signs attestations with
    pub signing_key: String,
    /// Hex-encoded ElGamal decryption key matching the bridge's encryption key
    pub decryption_key: String,
    /// Bridge contract address (part of every attestation digest)
    pub bridge_contract: String,
    /// Amounts are decrypted within `[0, 2^decrypt_bound_bits)`
    pub decrypt_bound_bits: u8,
    /// Running per-token totals are decrypted within `[0, 2^volume_bound_bits)`
    pub volume_bound_bits: u8,
    /// First nonce handed out by this instance
    pub nonce_start: u64,
    /// Recently attested transfers remembered to avoid double signing
    pub cache_size: usize,
    pub cache_ttl_secs: u64,
}

// Key material never reaches logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("signing_key", &"<redacted>")
            .field("decryption_key", &"<redacted>")
            .field("bridge_contract", &self.bridge_contract)
            .field("decrypt_bound_bits", &self.decrypt_bound_bits)
            .field("volume_bound_bits", &self.volume_bound_bits)
            .field("nonce_start", &self.nonce_start)
            .field("cache_size", &self.cache_size)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment
    pub fn load() -> Result<Self, AttestorError> {
        // Try to load .env file
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded .env from {:?}", path);
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AttestorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AttestorError::config(format!("{} required", key)))
        };
        let parsed = |key: &str, default: u64| -> Result<u64, AttestorError> {
            match lookup(key) {
                Some(v) => v
                    .trim()
                    .parse()
                    .map_err(|_| AttestorError::config(format!("Invalid {}", key))),
                None => Ok(default),
            }
        };

        let bound_bits = |key: &str, default: u64| -> Result<u8, AttestorError> {
            let bits = parsed(key, default)?;
            if bits == 0 || bits > MAX_DECRYPT_BOUND_BITS as u64 {
                return Err(AttestorError::config(format!(
                    "{} must be 1-{}",
                    key, MAX_DECRYPT_BOUND_BITS
                )));
            }
            Ok(bits as u8)
        };

        let decrypt_bound_bits = bound_bits("ATTESTOR_DECRYPT_BOUND_BITS", 32)?;
        let volume_bound_bits = bound_bits("ATTESTOR_VOLUME_BOUND_BITS", 40)?;
        let cache_size = parsed("ATTESTOR_CACHE_SIZE", 10_000)?;
        if cache_size == 0 {
            return Err(AttestorError::config("ATTESTOR_CACHE_SIZE must be positive"));
        }

        Ok(Self {
            signing_key: required("ATTESTOR_SIGNING_KEY")?,
            decryption_key: required("ATTESTOR_DECRYPTION_KEY")?,
            bridge_contract: required("BRIDGE_CONTRACT")?,
            decrypt_bound_bits,
            volume_bound_bits,
            nonce_start: parsed("ATTESTOR_NONCE_START", 1)?,
            cache_size: cache_size as usize,
            cache_ttl_secs: parsed("ATTESTOR_CACHE_TTL_SECS", 86_400)?,
        })
    }

    /// Exclusive upper bound for decrypted amounts.
    pub fn decrypt_bound(&self) -> u64 {
        1u64 << self.decrypt_bound_bits
    }

    /// Exclusive upper bound for decrypted per-token volume totals.
    pub fn volume_bound(&self) -> u64 {
        1u64 << self.volume_bound_bits
    }
}
