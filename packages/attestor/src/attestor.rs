//! Attestation pipeline.
//!
//! For each pending transfer the attestor:
//! 1. skips transfers that are not attestable or have a signature in flight
//! 2. decrypts the amount within the configured bound
//! 3. asks the `TransferValidator` for a verdict
//! 4. allocates the next nonce and signs the bridge digest
//!
//! Signed transfers stay in the in-flight cache until the bridge reports them
//! as no longer pending. A submission the bridge refused must be released with
//! [`Attestor::forget`] so the transfer is signed again on the next pass.
//!
//! Nonces are monotonic per instance and never reused, even for transfers whose
//! submission later fails. The bridge rejects replays, so a restarted instance
//! must be given a `nonce_start` past the last nonce it used.

use common::{attestation_digest, AttestationClaim, DecryptionKey, EncryptedAmount};
use cosmic_bridge::msg::{DestinationProof, EncryptedVolumeResponse, ExecuteMsg};
use cosmic_bridge::state::TransferState;
use tracing::{debug, info, warn};

use crate::bounded_cache::BoundedIdCache;
use crate::config::Config;
use crate::error::AttestorError;
use crate::signer::AttestationSigner;
use crate::validator::{TransferValidator, Verdict};
use crate::TransferView;

/// What the attestor decided for one transfer
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Signed; the message is ready to broadcast to the bridge
    Submit(ExecuteMsg),
    /// Nothing to do (not attestable, or a signature is in flight)
    Skipped { reason: String },
    /// Will never be signed
    Rejected { reason: String },
    /// Not signed yet; process again later
    Deferred { reason: String },
}

/// Decrypted per-token volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeReport {
    pub token_id: u64,
    pub locked: u64,
    pub released: u64,
}

impl VolumeReport {
    /// Value created but not (yet) released on the destination side.
    pub fn outstanding(&self) -> u64 {
        self.locked.saturating_sub(self.released)
    }
}

pub struct Attestor<V> {
    signer: AttestationSigner,
    decryption: DecryptionKey,
    contract: String,
    decrypt_bound: u64,
    volume_bound: u64,
    next_nonce: u64,
    attested: BoundedIdCache,
    validator: V,
}

impl<V: TransferValidator> Attestor<V> {
    pub fn new(
        signer: AttestationSigner,
        decryption: DecryptionKey,
        contract: impl Into<String>,
        validator: V,
    ) -> Self {
        Self {
            signer,
            decryption,
            contract: contract.into(),
            decrypt_bound: 1 << 32,
            volume_bound: 1 << 40,
            next_nonce: 1,
            attested: BoundedIdCache::new(10_000, 86_400),
            validator,
        }
    }

    /// Build an attestor from loaded configuration.
    pub fn from_config(config: &Config, validator: V) -> Result<Self, AttestorError> {
        let signer = AttestationSigner::from_hex(&config.signing_key)?;
        let secret = hex::decode(config.decryption_key.trim().trim_start_matches("0x"))
            .map_err(|e| AttestorError::config(format!("ATTESTOR_DECRYPTION_KEY: {}", e)))?;
        let decryption = DecryptionKey::from_bytes(&secret)?;

        Ok(Self::new(signer, decryption, config.bridge_contract.clone(), validator)
            .with_decrypt_bound(config.decrypt_bound())
            .with_volume_bound(config.volume_bound())
            .with_nonce_start(config.nonce_start)
            .with_cache(BoundedIdCache::new(config.cache_size, config.cache_ttl_secs)))
    }

    pub fn with_decrypt_bound(mut self, bound: u64) -> Self {
        self.decrypt_bound = bound;
        self
    }

    /// Bound for decrypting running per-token totals, which outgrow any
    /// single transfer.
    pub fn with_volume_bound(mut self, bound: u64) -> Self {
        self.volume_bound = bound;
        self
    }

    pub fn with_nonce_start(mut self, nonce: u64) -> Self {
        self.next_nonce = nonce;
        self
    }

    pub fn with_cache(mut self, cache: BoundedIdCache) -> Self {
        self.attested = cache;
        self
    }

    pub fn verifier_address(&self) -> &str {
        self.signer.address()
    }

    pub fn next_nonce(&self) -> u64 {
        self.next_nonce
    }

    /// Decide on one transfer and sign it when approved.
    pub fn process(&mut self, transfer: &TransferView) -> Result<Outcome, AttestorError> {
        if transfer.state != TransferState::Pending {
            self.attested.remove(transfer.id);
            return Ok(Outcome::Skipped {
                reason: format!("transfer is {}", transfer.state),
            });
        }
        if !transfer.attestable {
            return Ok(Outcome::Skipped {
                reason: "transfer is pending but not attestable".to_string(),
            });
        }
        if let Some(nonce) = self.attested.get(transfer.id) {
            return Ok(Outcome::Skipped {
                reason: format!("signature with nonce {} in flight", nonce),
            });
        }

        let amount = match self.open(transfer) {
            Ok(amount) => amount,
            Err(reason) => {
                warn!(transfer_id = transfer.id, %reason, "Rejecting transfer");
                return Ok(Outcome::Rejected { reason });
            }
        };

        match self.validator.validate(transfer, amount) {
            Verdict::Approve => {}
            Verdict::Reject { reason } => {
                warn!(transfer_id = transfer.id, %reason, "Validator rejected transfer");
                return Ok(Outcome::Rejected { reason });
            }
            Verdict::Defer { reason } => {
                debug!(transfer_id = transfer.id, %reason, "Validator deferred transfer");
                return Ok(Outcome::Deferred { reason });
            }
        }

        let nonce = self.allocate_nonce()?;
        let digest = attestation_digest(&AttestationClaim {
            contract: &self.contract,
            transfer_id: transfer.id,
            nonce,
            source_chain_id: transfer.source_chain_id,
            dest_chain_id: transfer.dest_chain_id,
            token_id: transfer.token_id,
            amount_fingerprint: transfer.amount.fingerprint(),
        });
        let signature = self.signer.sign_digest(&digest)?;
        self.attested.insert(transfer.id, nonce);

        info!(
            transfer_id = transfer.id,
            nonce,
            source_chain_id = transfer.source_chain_id,
            dest_chain_id = transfer.dest_chain_id,
            "Signed attestation"
        );

        Ok(Outcome::Submit(ExecuteMsg::SubmitAttestation {
            transfer_id: transfer.id,
            signature,
            nonce,
        }))
    }

    /// Release the in-flight entry for a transfer whose submission was refused
    /// or lost, so the next `process` signs it again under a fresh nonce.
    pub fn forget(&mut self, transfer_id: u64) -> bool {
        match self.attested.remove(transfer_id) {
            Some(nonce) => {
                debug!(transfer_id, nonce, "Forgot in-flight attestation");
                true
            }
            None => false,
        }
    }

    /// Decrypt a transfer amount and cross-check it against the declared range.
    fn open(&self, transfer: &TransferView) -> Result<u64, String> {
        let amount = self
            .decrypt(&transfer.amount, self.decrypt_bound)
            .map_err(|e| e.to_string())?;
        if let Some(range) = &transfer.declared_range {
            if amount < range.min || amount > range.max {
                return Err(format!(
                    "decrypted amount outside declared range [{}, {}]",
                    range.min, range.max
                ));
            }
        }
        Ok(amount)
    }

    fn decrypt(&self, amount: &EncryptedAmount, bound: u64) -> Result<u64, AttestorError> {
        Ok(self.decryption.decrypt(amount, bound)?)
    }

    fn allocate_nonce(&mut self) -> Result<u64, AttestorError> {
        let nonce = self.next_nonce;
        self.next_nonce = nonce.checked_add(1).ok_or(AttestorError::NonceExhausted)?;
        Ok(nonce)
    }

    /// Decrypt the bridge's running per-token totals.
    pub fn reconcile_volume(
        &self,
        volume: &EncryptedVolumeResponse,
    ) -> Result<VolumeReport, AttestorError> {
        let open = |amount: &Option<EncryptedAmount>| match amount {
            Some(amount) => self.decrypt(amount, self.volume_bound),
            None => Ok(0),
        };
        let report = VolumeReport {
            token_id: volume.token_id,
            locked: open(&volume.locked)?,
            released: open(&volume.released)?,
        };
        debug!(
            token_id = report.token_id,
            "Reconciled encrypted volume"
        );
        Ok(report)
    }

    pub fn cache_info(&self) -> (usize, usize) {
        self.attested.capacity_info()
    }
}

/// Destination-side proof that releases an attested transfer.
pub fn destination_proof(transfer: &TransferView) -> Result<DestinationProof, AttestorError> {
    match (&transfer.state, &transfer.attestation_ref) {
        (TransferState::Attested, Some(reference)) => Ok(DestinationProof {
            transfer_id: transfer.id,
            dest_chain_id: transfer.dest_chain_id,
            attestation_ref: reference.clone(),
        }),
        _ => Err(AttestorError::NotAttested {
            id: transfer.id,
            state: transfer.state.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::encrypt_with_proof;
    use cosmic_bridge::state::AmountRange;
    use cosmwasm_std::{Addr, Binary, Timestamp};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::validator::AmountPolicy;

    struct Fixture {
        rng: StdRng,
        decryption: DecryptionKey,
    }

    impl Fixture {
        fn new() -> Self {
            let mut rng = StdRng::seed_from_u64(21);
            let decryption = DecryptionKey::generate(&mut rng);
            Self { rng, decryption }
        }

        fn attestor<V: TransferValidator>(&mut self, validator: V) -> Attestor<V> {
            let signer = AttestationSigner::generate(&mut self.rng).unwrap();
            let decryption = DecryptionKey::from_bytes(&self.decryption.to_bytes()).unwrap();
            Attestor::new(signer, decryption, "terra1bridge", validator)
                .with_decrypt_bound(1 << 20)
                .with_volume_bound(1 << 24)
        }

        fn transfer(&mut self, id: u64, value: u64) -> TransferView {
            let (amount, _) =
                encrypt_with_proof(value, 0, 16, self.decryption.encryption_key(), &mut self.rng)
                    .unwrap();
            TransferView {
                id,
                sender: Addr::unchecked("terra1user"),
                source_chain_id: 1,
                dest_chain_id: 137,
                token_id: 2,
                amount,
                state: TransferState::Pending,
                created_at: Timestamp::from_seconds(1_000),
                expires_at: Timestamp::from_seconds(90_000),
                attestation_ref: None,
                attested_nonce: None,
                declared_range: Some(AmountRange {
                    min: 0,
                    max: (1 << 16) - 1,
                }),
                attestable: true,
            }
        }
    }

    fn submitted_nonce(outcome: Outcome) -> u64 {
        match outcome {
            Outcome::Submit(ExecuteMsg::SubmitAttestation { nonce, .. }) => nonce,
            other => panic!("expected submission, got {:?}", other),
        }
    }

    #[test]
    fn test_nonces_are_monotonic() {
        let mut fixture = Fixture::new();
        let mut attestor = fixture.attestor(AmountPolicy::default()).with_nonce_start(40);
        let first = fixture.transfer(1, 10);
        let second = fixture.transfer(2, 20);

        assert_eq!(submitted_nonce(attestor.process(&first).unwrap()), 40);
        assert_eq!(submitted_nonce(attestor.process(&second).unwrap()), 41);
        assert_eq!(attestor.next_nonce(), 42);
    }

    #[test]
    fn test_does_not_sign_twice_while_in_flight() {
        let mut fixture = Fixture::new();
        let mut attestor = fixture.attestor(AmountPolicy::default());
        let transfer = fixture.transfer(1, 10);

        attestor.process(&transfer).unwrap();
        assert!(matches!(
            attestor.process(&transfer).unwrap(),
            Outcome::Skipped { .. }
        ));
        assert_eq!(attestor.next_nonce(), 2);
        assert_eq!(attestor.cache_info().0, 1);
    }

    #[test]
    fn test_forget_allows_resigning_with_fresh_nonce() {
        let mut fixture = Fixture::new();
        let mut attestor = fixture.attestor(AmountPolicy::default());
        let transfer = fixture.transfer(1, 10);

        assert_eq!(submitted_nonce(attestor.process(&transfer).unwrap()), 1);
        assert!(attestor.forget(1));
        assert!(!attestor.forget(1));
        assert_eq!(submitted_nonce(attestor.process(&transfer).unwrap()), 2);
    }

    #[test]
    fn test_settled_transfer_leaves_cache() {
        let mut fixture = Fixture::new();
        let mut attestor = fixture.attestor(AmountPolicy::default());
        let mut transfer = fixture.transfer(1, 10);

        attestor.process(&transfer).unwrap();
        transfer.state = TransferState::Attested;
        assert!(matches!(
            attestor.process(&transfer).unwrap(),
            Outcome::Skipped { .. }
        ));
        assert_eq!(attestor.cache_info().0, 0);
    }

    #[test]
    fn test_skips_non_attestable() {
        let mut fixture = Fixture::new();
        let mut attestor = fixture.attestor(AmountPolicy::default());
        let mut transfer = fixture.transfer(1, 10);
        transfer.attestable = false;
        assert!(matches!(
            attestor.process(&transfer).unwrap(),
            Outcome::Skipped { .. }
        ));
        transfer.attestable = true;
        transfer.state = TransferState::Cancelled;
        assert!(matches!(
            attestor.process(&transfer).unwrap(),
            Outcome::Skipped { .. }
        ));
        assert_eq!(attestor.next_nonce(), 1);
    }

    #[test]
    fn test_policy_rejection_consumes_no_nonce() {
        let mut fixture = Fixture::new();
        let mut attestor = fixture.attestor(AmountPolicy {
            min: 100,
            max: 1_000,
            tokens: Some(vec![2]),
        });

        let small = fixture.transfer(1, 99);
        match attestor.process(&small).unwrap() {
            Outcome::Rejected { reason } => assert_eq!(reason, "amount below minimum 100"),
            other => panic!("unexpected {:?}", other),
        }

        let mut other_token = fixture.transfer(2, 500);
        other_token.token_id = 3;
        assert!(matches!(
            attestor.process(&other_token).unwrap(),
            Outcome::Rejected { .. }
        ));

        assert_eq!(submitted_nonce(attestor.process(&fixture.transfer(3, 1_000)).unwrap()), 1);
    }

    #[test]
    fn test_deferred_transfer_can_be_signed_later() {
        let mut fixture = Fixture::new();
        let ready = std::cell::Cell::new(false);
        let validator = |_: &TransferView, _: u64| {
            if ready.get() {
                Verdict::Approve
            } else {
                Verdict::Defer {
                    reason: "source not final".to_string(),
                }
            }
        };
        let mut attestor = fixture.attestor(validator);
        let transfer = fixture.transfer(1, 5);

        assert!(matches!(
            attestor.process(&transfer).unwrap(),
            Outcome::Deferred { .. }
        ));
        ready.set(true);
        assert_eq!(submitted_nonce(attestor.process(&transfer).unwrap()), 1);
    }

    #[test]
    fn test_rejects_foreign_and_out_of_bound_amounts() {
        let mut fixture = Fixture::new();
        let mut attestor = fixture.attestor(AmountPolicy::default());

        let mut foreign = fixture.transfer(1, 10);
        let other = DecryptionKey::generate(&mut fixture.rng);
        foreign.amount = EncryptedAmount::encrypt(10, other.encryption_key(), &mut fixture.rng);
        assert!(matches!(
            attestor.process(&foreign).unwrap(),
            Outcome::Rejected { .. }
        ));

        let mut huge = fixture.transfer(2, 10);
        let key = fixture.decryption.encryption_key().clone();
        huge.amount = EncryptedAmount::encrypt(1 << 21, &key, &mut fixture.rng);
        huge.declared_range = None;
        assert!(matches!(
            attestor.process(&huge).unwrap(),
            Outcome::Rejected { .. }
        ));
    }

    #[test]
    fn test_destination_proof_requires_attested() {
        let mut fixture = Fixture::new();
        let mut transfer = fixture.transfer(4, 10);
        assert!(matches!(
            destination_proof(&transfer),
            Err(AttestorError::NotAttested { id: 4, .. })
        ));

        transfer.state = TransferState::Attested;
        transfer.attestation_ref = Some(Binary::from(vec![7u8; 32]));
        let proof = destination_proof(&transfer).unwrap();
        assert_eq!(proof.transfer_id, 4);
        assert_eq!(proof.dest_chain_id, 137);
        assert_eq!(proof.attestation_ref, Binary::from(vec![7u8; 32]));
    }

    #[test]
    fn test_reconcile_volume() {
        let mut fixture = Fixture::new();
        let attestor = fixture.attestor(AmountPolicy::default());
        let key = fixture.decryption.encryption_key().clone();
        let locked = EncryptedAmount::encrypt(700, &key, &mut fixture.rng)
            .homomorphic_add(&EncryptedAmount::encrypt(300, &key, &mut fixture.rng))
            .unwrap();

        let report = attestor
            .reconcile_volume(&EncryptedVolumeResponse {
                token_id: 2,
                locked: Some(locked),
                released: Some(EncryptedAmount::encrypt(250, &key, &mut fixture.rng)),
            })
            .unwrap();
        assert_eq!(report.locked, 1_000);
        assert_eq!(report.released, 250);
        assert_eq!(report.outstanding(), 750);
    }

    #[test]
    fn test_reconcile_volume_above_transfer_bound() {
        let mut fixture = Fixture::new();
        // Transfers decrypt within 2^20; two of them sum past it
        let attestor = fixture.attestor(AmountPolicy::default());
        let key = fixture.decryption.encryption_key().clone();
        let locked = EncryptedAmount::encrypt(600_000, &key, &mut fixture.rng)
            .homomorphic_add(&EncryptedAmount::encrypt(600_000, &key, &mut fixture.rng))
            .unwrap();

        let report = attestor
            .reconcile_volume(&EncryptedVolumeResponse {
                token_id: 2,
                locked: Some(locked),
                released: None,
            })
            .unwrap();
        assert_eq!(report.locked, 1_200_000);
        assert_eq!(report.released, 0);
        assert_eq!(report.outstanding(), 1_200_000);
    }
}
