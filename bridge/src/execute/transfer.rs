//! Transfer ledger handlers.
//!
//! State machine per transfer:
//! - Pending -> Attested -> Released
//! - Pending -> Expired (anyone, once the TTL has elapsed)
//! - Pending -> Cancelled (original sender)
//!
//! Attestation is only reachable through the verifier gateway
//! (`execute/attestation.rs`), which calls [`attest`] after the signature and
//! nonce checks pass. Every handler validates fully before its first write.

use common::{attach_proof, CryptoError, EncryptedAmount, EncryptionKey, RangeProof};
use cosmwasm_std::{to_json_binary, Binary, DepsMut, Env, Event, MessageInfo, Response, Storage};
use cw_storage_plus::Map;

use crate::audit::record_transfer;
use crate::error::ContractError;
use crate::msg::DestinationProof;
use crate::state::{
    AmountRange, AuditKind, ChainInfo, Config, TokenInfo, TransferRecord, TransferState, CHAINS,
    CONFIG, LOCKED_VOLUME, RELEASED_VOLUME, TOKENS, TRANSFERS, TRANSFERS_BY_SENDER,
    TRANSFER_COUNT,
};

// ============================================================================
// Helpers
// ============================================================================

pub(crate) fn load_transfer(
    storage: &dyn Storage,
    transfer_id: u64,
) -> Result<TransferRecord, ContractError> {
    TRANSFERS
        .may_load(storage, transfer_id)?
        .ok_or_else(|| ContractError::not_found("Transfer", transfer_id))
}

fn load_enabled_chain(storage: &dyn Storage, chain_id: u64) -> Result<ChainInfo, ContractError> {
    let chain = CHAINS
        .may_load(storage, chain_id)?
        .ok_or_else(|| ContractError::not_found("Chain", chain_id))?;
    if !chain.enabled {
        return Err(ContractError::ChainDisabled { chain_id });
    }
    Ok(chain)
}

fn load_enabled_token(storage: &dyn Storage, token_id: u64) -> Result<TokenInfo, ContractError> {
    let token = TOKENS
        .may_load(storage, token_id)?
        .ok_or_else(|| ContractError::not_found("Token", token_id))?;
    if !token.enabled {
        return Err(ContractError::TokenDisabled { token_id });
    }
    Ok(token)
}

fn range_proof_error(err: CryptoError) -> ContractError {
    match err {
        CryptoError::InvalidRangeProof { reason } => ContractError::InvalidRangeProof { reason },
        other => ContractError::InvalidRangeProof {
            reason: other.to_string(),
        },
    }
}

/// Check the amount against the bridge context and the range-proof policy.
///
/// Returns the amount back together with the proven range, if any.
fn check_amount(
    config: &Config,
    amount: EncryptedAmount,
    range_proof: Option<RangeProof>,
) -> Result<(EncryptedAmount, Option<AmountRange>), ContractError> {
    let key = EncryptionKey::from_bytes(config.encryption_key.as_slice())?;
    if !amount.is_bound_to(&key) {
        return Err(ContractError::ContextMismatch);
    }
    amount.validate()?;

    match range_proof {
        Some(proof) => {
            if proof.bits > config.max_amount_bits {
                return Err(ContractError::InvalidRangeProof {
                    reason: format!(
                        "declared range of {} bits exceeds the {}-bit limit",
                        proof.bits, config.max_amount_bits
                    ),
                });
            }
            let proven = attach_proof(amount, &proof).map_err(range_proof_error)?;
            let range = AmountRange {
                min: proven.min(),
                max: proven.max(),
            };
            Ok((proven.into_amount(), Some(range)))
        }
        None if config.require_range_proof => Err(ContractError::InvalidRangeProof {
            reason: "range proof required".to_string(),
        }),
        None => Ok((amount, None)),
    }
}

fn accumulate(
    storage: &mut dyn Storage,
    volume: &Map<u64, EncryptedAmount>,
    token_id: u64,
    amount: &EncryptedAmount,
) -> Result<(), ContractError> {
    let total = match volume.may_load(storage, token_id)? {
        Some(total) => total.homomorphic_add(amount)?,
        None => amount.clone(),
    };
    volume.save(storage, token_id, &total)?;
    Ok(())
}

// ============================================================================
// Create
// ============================================================================

/// Create a pending transfer from an encrypted-amount lock intent.
#[allow(clippy::too_many_arguments)]
pub fn execute_create_transfer(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    source_chain_id: u64,
    dest_chain_id: u64,
    token_id: u64,
    amount: EncryptedAmount,
    range_proof: Option<RangeProof>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    if source_chain_id == dest_chain_id {
        return Err(ContractError::SameChain {
            chain_id: source_chain_id,
        });
    }
    load_enabled_chain(deps.storage, source_chain_id)?;
    load_enabled_chain(deps.storage, dest_chain_id)?;
    load_enabled_token(deps.storage, token_id)?;
    let (amount, declared_range) = check_amount(&config, amount, range_proof)?;

    let id = TRANSFER_COUNT.may_load(deps.storage)?.unwrap_or(0) + 1;
    let expires_at = env.block.time.plus_seconds(config.transfer_ttl);
    let record = TransferRecord {
        id,
        sender: info.sender.clone(),
        source_chain_id,
        dest_chain_id,
        token_id,
        amount,
        state: TransferState::Pending,
        created_at: env.block.time,
        expires_at,
        attestation_ref: None,
        attested_nonce: None,
        declared_range,
        updated_at: env.block.time,
    };

    TRANSFER_COUNT.save(deps.storage, &id)?;
    TRANSFERS.save(deps.storage, id, &record)?;
    TRANSFERS_BY_SENDER.save(deps.storage, (&info.sender, id), &true)?;
    accumulate(deps.storage, &LOCKED_VOLUME, token_id, &record.amount)?;

    let event = record_transfer(
        deps.storage,
        &env,
        AuditKind::TransferCreated,
        id,
        TransferState::Pending,
    )?
    .add_attribute("sender", info.sender.to_string())
    .add_attribute("source_chain_id", source_chain_id.to_string())
    .add_attribute("dest_chain_id", dest_chain_id.to_string())
    .add_attribute("token_id", token_id.to_string())
    .add_attribute("expires_at", expires_at.seconds().to_string());

    Ok(Response::new()
        .add_attribute("method", "create_transfer")
        .add_attribute("transfer_id", id.to_string())
        .add_event(event)
        .set_data(to_json_binary(&id)?))
}

// ============================================================================
// Attest (verifier gateway only)
// ============================================================================

/// A transfer can be attested while Pending and strictly before its deadline.
pub(crate) fn ensure_attestable(record: &TransferRecord, env: &Env) -> Result<(), ContractError> {
    if record.state != TransferState::Pending {
        return Err(ContractError::NotPending {
            id: record.id,
            state: record.state,
        });
    }
    if env.block.time >= record.expires_at {
        return Err(ContractError::Expired {
            id: record.id,
            expired_at: record.expires_at,
        });
    }
    Ok(())
}

/// Move a transfer to Attested. Callers must have authenticated the attestation.
pub(crate) fn attest(
    storage: &mut dyn Storage,
    env: &Env,
    mut record: TransferRecord,
    attestation_ref: Binary,
    nonce: u64,
) -> Result<Event, ContractError> {
    ensure_attestable(&record, env)?;

    record.state = TransferState::Attested;
    record.attestation_ref = Some(attestation_ref.clone());
    record.attested_nonce = Some(nonce);
    record.updated_at = env.block.time;
    TRANSFERS.save(storage, record.id, &record)?;

    Ok(record_transfer(
        storage,
        env,
        AuditKind::TransferAttested,
        record.id,
        TransferState::Attested,
    )?
    .add_attribute("attestation_ref", attestation_ref.to_base64())
    .add_attribute("nonce", nonce.to_string()))
}

// ============================================================================
// Release / Expire / Cancel
// ============================================================================

/// Release an attested transfer against its destination proof.
pub fn execute_release(
    deps: DepsMut,
    env: Env,
    transfer_id: u64,
    proof: DestinationProof,
) -> Result<Response, ContractError> {
    let mut record = load_transfer(deps.storage, transfer_id)?;
    if record.state != TransferState::Attested {
        return Err(ContractError::NotAttested {
            id: transfer_id,
            state: record.state,
        });
    }
    let matches = proof.transfer_id == record.id
        && proof.dest_chain_id == record.dest_chain_id
        && record.attestation_ref.as_ref() == Some(&proof.attestation_ref);
    if !matches {
        return Err(ContractError::ProofMismatch { id: transfer_id });
    }

    record.state = TransferState::Released;
    record.updated_at = env.block.time;
    TRANSFERS.save(deps.storage, transfer_id, &record)?;
    accumulate(deps.storage, &RELEASED_VOLUME, record.token_id, &record.amount)?;

    let event = record_transfer(
        deps.storage,
        &env,
        AuditKind::TransferReleased,
        transfer_id,
        TransferState::Released,
    )?
    .add_attribute("dest_chain_id", record.dest_chain_id.to_string());

    Ok(Response::new()
        .add_attribute("method", "release")
        .add_attribute("transfer_id", transfer_id.to_string())
        .add_event(event))
}

/// Expire a pending transfer whose deadline has passed (anyone).
pub fn execute_expire(
    deps: DepsMut,
    env: Env,
    transfer_id: u64,
) -> Result<Response, ContractError> {
    let mut record = load_transfer(deps.storage, transfer_id)?;
    if record.state != TransferState::Pending {
        return Err(ContractError::NotPending {
            id: transfer_id,
            state: record.state,
        });
    }
    if env.block.time < record.expires_at {
        return Err(ContractError::NotExpired {
            id: transfer_id,
            expires_at: record.expires_at,
        });
    }

    record.state = TransferState::Expired;
    record.updated_at = env.block.time;
    TRANSFERS.save(deps.storage, transfer_id, &record)?;

    let event = record_transfer(
        deps.storage,
        &env,
        AuditKind::TransferExpired,
        transfer_id,
        TransferState::Expired,
    )?;

    Ok(Response::new()
        .add_attribute("method", "expire")
        .add_attribute("transfer_id", transfer_id.to_string())
        .add_event(event))
}

/// Cancel a pending transfer (original sender only).
pub fn execute_cancel(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    transfer_id: u64,
) -> Result<Response, ContractError> {
    let mut record = load_transfer(deps.storage, transfer_id)?;
    if info.sender != record.sender {
        return Err(ContractError::NotSender);
    }
    if record.state != TransferState::Pending {
        return Err(ContractError::NotPending {
            id: transfer_id,
            state: record.state,
        });
    }

    record.state = TransferState::Cancelled;
    record.updated_at = env.block.time;
    TRANSFERS.save(deps.storage, transfer_id, &record)?;

    let event = record_transfer(
        deps.storage,
        &env,
        AuditKind::TransferCancelled,
        transfer_id,
        TransferState::Cancelled,
    )?;

    Ok(Response::new()
        .add_attribute("method", "cancel")
        .add_attribute("transfer_id", transfer_id.to_string())
        .add_event(event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::{mock_dependencies, mock_env};
    use cosmwasm_std::{Addr, Timestamp};
    use common::DecryptionKey;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(state: TransferState, expires_at: u64) -> TransferRecord {
        let mut rng = StdRng::seed_from_u64(3);
        let key = DecryptionKey::generate(&mut rng);
        TransferRecord {
            id: 1,
            sender: Addr::unchecked("sender"),
            source_chain_id: 1,
            dest_chain_id: 137,
            token_id: 2,
            amount: EncryptedAmount::encrypt(10, key.encryption_key(), &mut rng),
            state,
            created_at: Timestamp::from_seconds(0),
            expires_at: Timestamp::from_seconds(expires_at),
            attestation_ref: None,
            attested_nonce: None,
            declared_range: None,
            updated_at: Timestamp::from_seconds(0),
        }
    }

    #[test]
    fn test_attest_requires_pending() {
        let mut deps = mock_dependencies();
        let env = mock_env();
        let far = env.block.time.seconds() + 100;
        for state in [
            TransferState::Attested,
            TransferState::Released,
            TransferState::Expired,
            TransferState::Cancelled,
        ] {
            let err = attest(
                &mut deps.storage,
                &env,
                record(state, far),
                Binary::from(vec![1u8; 32]),
                1,
            )
            .unwrap_err();
            assert_eq!(err, ContractError::NotPending { id: 1, state });
        }
        assert!(TRANSFERS.may_load(&deps.storage, 1).unwrap().is_none());
    }

    #[test]
    fn test_attest_at_deadline_is_expired() {
        let mut deps = mock_dependencies();
        let env = mock_env();
        let now = env.block.time.seconds();
        let err = attest(
            &mut deps.storage,
            &env,
            record(TransferState::Pending, now),
            Binary::from(vec![1u8; 32]),
            1,
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::Expired { id: 1, .. }));
    }

    #[test]
    fn test_attest_sets_reference_and_nonce() {
        let mut deps = mock_dependencies();
        let env = mock_env();
        let far = env.block.time.seconds() + 100;
        let event = attest(
            &mut deps.storage,
            &env,
            record(TransferState::Pending, far),
            Binary::from(vec![7u8; 32]),
            42,
        )
        .unwrap();
        assert_eq!(event.ty, "transfer_attested");

        let stored = TRANSFERS.load(&deps.storage, 1).unwrap();
        assert_eq!(stored.state, TransferState::Attested);
        assert_eq!(stored.attestation_ref, Some(Binary::from(vec![7u8; 32])));
        assert_eq!(stored.attested_nonce, Some(42));
    }
}
