//! Verifier gateway.
//!
//! The attestation payload is a 65-byte secp256k1 signature over the digest of
//! the stored transfer (see `common::attestation`). The signer is recovered on
//! chain and must equal the configured verifier address. Nonces are consumed
//! globally and survive verifier rotation.

use common::{
    attestation_digest, attestation_ref, evm_address_from_pubkey, format_evm_address,
    split_signature, AttestationClaim,
};
use cosmwasm_std::{Api, Binary, DepsMut, Env, Response};

use crate::error::ContractError;
use crate::execute::transfer::{attest, ensure_attestable, load_transfer};
use crate::state::{TransferRecord, CONFIG, USED_NONCES};

/// Digest the verifier signs for `record` under `nonce`.
pub(crate) fn digest_for(contract: &str, record: &TransferRecord, nonce: u64) -> [u8; 32] {
    attestation_digest(&AttestationClaim {
        contract,
        transfer_id: record.id,
        nonce,
        source_chain_id: record.source_chain_id,
        dest_chain_id: record.dest_chain_id,
        token_id: record.token_id,
        amount_fingerprint: record.amount.fingerprint(),
    })
}

/// Recover the 0x-prefixed signer address of `signature` over `digest`.
fn recover_signer(
    api: &dyn Api,
    digest: &[u8; 32],
    signature: &[u8],
) -> Result<String, ContractError> {
    let (rs, recovery_id) =
        split_signature(signature).map_err(|e| ContractError::InvalidSignature {
            reason: e.to_string(),
        })?;
    let pubkey = api
        .secp256k1_recover_pubkey(digest, rs, recovery_id)
        .map_err(|e| ContractError::InvalidSignature {
            reason: e.to_string(),
        })?;
    let address = evm_address_from_pubkey(&pubkey).map_err(|e| ContractError::InvalidSignature {
        reason: e.to_string(),
    })?;
    Ok(format_evm_address(&address))
}

/// Submit a verifier attestation for a pending transfer.
///
/// Order of checks: signature recovers to the verifier, nonce unused, transfer
/// attestable. The nonce is consumed only together with the state transition.
pub fn execute_submit_attestation(
    deps: DepsMut,
    env: Env,
    transfer_id: u64,
    signature: Binary,
    nonce: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let record = load_transfer(deps.storage, transfer_id)?;

    let digest = digest_for(env.contract.address.as_str(), &record, nonce);
    let signer = recover_signer(deps.api, &digest, signature.as_slice())?;
    if signer != config.verifier {
        return Err(ContractError::UnauthorizedVerifier { signer });
    }

    if USED_NONCES.has(deps.storage, nonce) {
        return Err(ContractError::ReplayedNonce { nonce });
    }
    ensure_attestable(&record, &env)?;

    let reference = Binary::from(attestation_ref(&digest, signature.as_slice())?.to_vec());
    USED_NONCES.save(deps.storage, nonce, &transfer_id)?;
    let event = attest(deps.storage, &env, record, reference.clone(), nonce)?
        .add_attribute("verifier", signer);

    Ok(Response::new()
        .add_attribute("method", "submit_attestation")
        .add_attribute("transfer_id", transfer_id.to_string())
        .add_attribute("nonce", nonce.to_string())
        .add_attribute("attestation_ref", reference.to_base64())
        .add_event(event))
}
