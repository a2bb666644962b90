//! Integration tests for the verifier gateway.
//!
//! Tests signer recovery against the configured verifier, the global nonce
//! window (replay on the same and on other transfers), verifier rotation, and
//! parity between the on-chain digest and the shared digest function.

use common::{
    attestation_digest, encrypt_with_proof, evm_address_from_pubkey, format_evm_address,
    AttestationClaim, DecryptionKey,
};
use cosmwasm_std::{Addr, Binary};
use cw_multi_test::{App, AppResponse, ContractWrapper, Executor};
use k256::ecdsa::SigningKey;
use rand::rngs::StdRng;
use rand::SeedableRng;

use cosmic_bridge::msg::{
    AttestationDigestResponse, ConfigResponse, ExecuteMsg, InstantiateMsg, NonceUsedResponse,
    QueryMsg, TransferResponse,
};
use cosmic_bridge::state::TransferState;
use cosmic_bridge::ContractError;

// ============================================================================
// Test Setup
// ============================================================================

fn contract_bridge() -> Box<dyn cw_multi_test::Contract<cosmwasm_std::Empty>> {
    let contract = ContractWrapper::new(
        cosmic_bridge::contract::execute,
        cosmic_bridge::contract::instantiate,
        cosmic_bridge::contract::query,
    );
    Box::new(contract)
}

type ExecResult = anyhow::Result<AppResponse>;

struct TestEnv {
    app: App,
    contract: Addr,
    owner: Addr,
    verifier: SigningKey,
    decryption: DecryptionKey,
    rng: StdRng,
}

fn address_of(key: &SigningKey) -> String {
    let point = key.verifying_key().to_encoded_point(false);
    format_evm_address(&evm_address_from_pubkey(point.as_bytes()).unwrap())
}

fn sign(key: &SigningKey, digest: &[u8], v_offset: u8) -> Binary {
    let (sig, recid) = key.sign_prehash_recoverable(digest).unwrap();
    let mut bytes = sig.to_bytes().to_vec();
    bytes.push(recid.to_byte() + v_offset);
    Binary::from(bytes)
}

fn root_cause(res: ExecResult) -> String {
    res.unwrap_err().root_cause().to_string()
}

/// Default catalog (chains 1/137/56/43114, tokens 1-4) and two pending transfers.
fn setup() -> TestEnv {
    let mut app = App::default();
    let mut rng = StdRng::seed_from_u64(7);
    let verifier = SigningKey::random(&mut rng);
    let decryption = DecryptionKey::generate(&mut rng);
    let owner = Addr::unchecked("terra1owner");

    let code_id = app.store_code(contract_bridge());
    let contract = app
        .instantiate_contract(
            code_id,
            owner.clone(),
            &InstantiateMsg {
                owner: Some(owner.to_string()),
                verifier: address_of(&verifier),
                encryption_key: decryption.encryption_key().to_binary(),
                transfer_ttl_seconds: Some(3_600),
                max_amount_bits: Some(32),
                require_range_proof: Some(true),
                chains: None,
                tokens: None,
            },
            &[],
            "cosmic-bridge",
            None,
        )
        .unwrap();

    let mut env = TestEnv {
        app,
        contract,
        owner,
        verifier,
        decryption,
        rng,
    };
    env.create_transfer(100);
    env.create_transfer(200);
    env
}

impl TestEnv {
    fn create_transfer(&mut self, value: u64) {
        let (amount, proof) = encrypt_with_proof(
            value,
            0,
            16,
            self.decryption.encryption_key(),
            &mut self.rng,
        )
        .unwrap();
        self.app
            .execute_contract(
                Addr::unchecked("terra1user"),
                self.contract.clone(),
                &ExecuteMsg::CreateTransfer {
                    source_chain_id: 1,
                    dest_chain_id: 137,
                    token_id: 2,
                    amount,
                    range_proof: Some(proof),
                },
                &[],
            )
            .unwrap();
    }

    fn digest(&self, transfer_id: u64, nonce: u64) -> Binary {
        let res: AttestationDigestResponse = self
            .app
            .wrap()
            .query_wasm_smart(
                &self.contract,
                &QueryMsg::AttestationDigest { transfer_id, nonce },
            )
            .unwrap();
        res.digest
    }

    fn submit(&mut self, transfer_id: u64, signature: Binary, nonce: u64) -> ExecResult {
        self.app.execute_contract(
            Addr::unchecked("terra1relayer"),
            self.contract.clone(),
            &ExecuteMsg::SubmitAttestation {
                transfer_id,
                signature,
                nonce,
            },
            &[],
        )
    }

    fn attest_with(&mut self, key: &SigningKey, transfer_id: u64, nonce: u64) -> ExecResult {
        let signature = sign(key, self.digest(transfer_id, nonce).as_slice(), 27);
        self.submit(transfer_id, signature, nonce)
    }

    fn state(&self, transfer_id: u64) -> TransferState {
        let transfer: TransferResponse = self
            .app
            .wrap()
            .query_wasm_smart(&self.contract, &QueryMsg::Transfer { transfer_id })
            .unwrap();
        transfer.state
    }

    fn nonce_used(&self, nonce: u64) -> NonceUsedResponse {
        self.app
            .wrap()
            .query_wasm_smart(&self.contract, &QueryMsg::NonceUsed { nonce })
            .unwrap()
    }
}

// ============================================================================
// Replay Protection
// ============================================================================

#[test]
fn test_same_attestation_twice_replays() {
    let mut env = setup();
    let signature = sign(&env.verifier, env.digest(1, 7).as_slice(), 27);

    env.submit(1, signature.clone(), 7).unwrap();
    let err = root_cause(env.submit(1, signature, 7));
    assert_eq!(err, ContractError::ReplayedNonce { nonce: 7 }.to_string());

    assert_eq!(env.state(1), TransferState::Attested);
    let used = env.nonce_used(7);
    assert!(used.used);
    assert_eq!(used.transfer_id, Some(1));
}

#[test]
fn test_nonce_is_global_across_transfers() {
    let mut env = setup();
    let verifier = env.verifier.clone();
    env.attest_with(&verifier, 1, 7).unwrap();

    let err = root_cause(env.attest_with(&verifier, 2, 7));
    assert_eq!(err, ContractError::ReplayedNonce { nonce: 7 }.to_string());
    assert_eq!(env.state(2), TransferState::Pending);

    env.attest_with(&verifier, 2, 8).unwrap();
    assert_eq!(env.state(2), TransferState::Attested);
}

#[test]
fn test_attested_transfer_cannot_be_reattested() {
    let mut env = setup();
    let verifier = env.verifier.clone();
    env.attest_with(&verifier, 1, 1).unwrap();
    let err = root_cause(env.attest_with(&verifier, 1, 2));
    assert_eq!(
        err,
        ContractError::NotPending {
            id: 1,
            state: TransferState::Attested
        }
        .to_string()
    );
    assert!(!env.nonce_used(2).used);
}

// ============================================================================
// Signer Authorization
// ============================================================================

#[test]
fn test_non_verifier_signature_unauthorized() {
    let mut env = setup();
    let impostor = SigningKey::random(&mut env.rng);

    let err = root_cause(env.attest_with(&impostor, 1, 7));
    assert_eq!(
        err,
        ContractError::UnauthorizedVerifier {
            signer: address_of(&impostor)
        }
        .to_string()
    );
    assert!(err.starts_with("Unauthorized"));
    assert_eq!(env.state(1), TransferState::Pending);
    assert!(!env.nonce_used(7).used);
}

#[test]
fn test_signature_bound_to_nonce_and_transfer() {
    let mut env = setup();

    // Signed for nonce 5, submitted with nonce 6
    let signature = sign(&env.verifier, env.digest(1, 5).as_slice(), 27);
    let err = root_cause(env.submit(1, signature, 6));
    assert!(err.contains("Unauthorized") || err.contains("Invalid signature"));

    // Signed for transfer 1, submitted for transfer 2
    let signature = sign(&env.verifier, env.digest(1, 5).as_slice(), 27);
    let err = root_cause(env.submit(2, signature, 5));
    assert!(err.contains("Unauthorized") || err.contains("Invalid signature"));

    assert_eq!(env.state(1), TransferState::Pending);
    assert_eq!(env.state(2), TransferState::Pending);
}

#[test]
fn test_malformed_signature_rejected() {
    let mut env = setup();
    let err = root_cause(env.submit(1, Binary::from(vec![1u8; 64]), 1));
    assert!(err.starts_with("Invalid signature"));

    let mut bytes = sign(&env.verifier, env.digest(1, 1).as_slice(), 0).to_vec();
    bytes[64] = 5;
    let err = root_cause(env.submit(1, Binary::from(bytes), 1));
    assert!(err.contains("unsupported recovery byte 5"));
}

#[test]
fn test_raw_recovery_id_accepted() {
    let mut env = setup();
    let signature = sign(&env.verifier, env.digest(1, 3).as_slice(), 0);
    env.submit(1, signature, 3).unwrap();
    assert_eq!(env.state(1), TransferState::Attested);
}

#[test]
fn test_unknown_transfer() {
    let mut env = setup();
    let verifier = env.verifier.clone();
    let err = root_cause(env.submit(
        99,
        sign(&verifier, &[0u8; 32], 27),
        1,
    ));
    assert_eq!(err, ContractError::not_found("Transfer", 99).to_string());
}

// ============================================================================
// Verifier Rotation
// ============================================================================

#[test]
fn test_rotation_keeps_pending_attestable_and_nonces_consumed() {
    let mut env = setup();
    let old = env.verifier.clone();
    let new = SigningKey::random(&mut env.rng);

    env.attest_with(&old, 1, 1).unwrap();

    let owner = env.owner.clone();
    let res = env
        .app
        .execute_contract(
            owner,
            env.contract.clone(),
            &ExecuteMsg::SetVerifier {
                verifier: address_of(&new),
            },
            &[],
        )
        .unwrap();
    assert!(res.events.iter().any(|e| e.ty == "wasm-verifier_changed"));

    let config: ConfigResponse = env
        .app
        .wrap()
        .query_wasm_smart(&env.contract, &QueryMsg::Config {})
        .unwrap();
    assert_eq!(config.verifier, address_of(&new));

    // Old key no longer accepted
    let err = root_cause(env.attest_with(&old, 2, 2));
    assert!(err.starts_with("Unauthorized"));

    // Consumed nonce stays consumed for the new verifier
    let err = root_cause(env.attest_with(&new, 2, 1));
    assert_eq!(err, ContractError::ReplayedNonce { nonce: 1 }.to_string());

    // Pending transfer from before the rotation is attestable by the new key
    env.attest_with(&new, 2, 2).unwrap();
    assert_eq!(env.state(2), TransferState::Attested);
}

#[test]
fn test_set_verifier_owner_only() {
    let mut env = setup();
    let err = root_cause(env.app.execute_contract(
        Addr::unchecked("terra1stranger"),
        env.contract.clone(),
        &ExecuteMsg::SetVerifier {
            verifier: "0x90F8bf6A479f320ead074411a4B0e7944Ea8c9C1".to_string(),
        },
        &[],
    ));
    assert_eq!(err, ContractError::Unauthorized.to_string());
}

// ============================================================================
// Digest Parity
// ============================================================================

#[test]
fn test_digest_query_matches_shared_computation() {
    let env = setup();
    let transfer: TransferResponse = env
        .app
        .wrap()
        .query_wasm_smart(&env.contract, &QueryMsg::Transfer { transfer_id: 2 })
        .unwrap();

    let expected = attestation_digest(&AttestationClaim {
        contract: env.contract.as_str(),
        transfer_id: 2,
        nonce: 11,
        source_chain_id: transfer.source_chain_id,
        dest_chain_id: transfer.dest_chain_id,
        token_id: transfer.token_id,
        amount_fingerprint: transfer.amount.fingerprint(),
    });
    assert_eq!(env.digest(2, 11).as_slice(), &expected);

    let res: AttestationDigestResponse = env
        .app
        .wrap()
        .query_wasm_smart(
            &env.contract,
            &QueryMsg::AttestationDigest {
                transfer_id: 2,
                nonce: 11,
            },
        )
        .unwrap();
    assert_eq!(res.digest_hex, format!("0x{}", hex::encode(expected)));
}
