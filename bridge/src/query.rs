//! Query handlers for the Cosmic Bridge contract.
//!
//! Reads never mutate. Paginated listings default to 10 entries, capped at 50.

use common::bytes32_to_hex;
use cosmwasm_std::{Binary, Deps, Env, Order, StdError, StdResult};
use cw_storage_plus::Bound;

use crate::execute::digest_for;
use crate::msg::{
    AttestationDigestResponse, AuditLogResponse, ChainsResponse, ConfigResponse,
    EncryptedVolumeResponse, NonceUsedResponse, OwnerResponse, TokensResponse, TransferResponse,
    TransfersResponse,
};
use crate::state::{
    ChainInfo, TokenInfo, TransferRecord, TransferState, AUDIT_LOG, CHAINS, CONFIG,
    LOCKED_VOLUME, RELEASED_VOLUME, TOKENS, TRANSFERS, TRANSFERS_BY_SENDER, TRANSFER_COUNT,
    USED_NONCES,
};

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 50;

fn page_limit(limit: Option<u32>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize
}

fn to_response(env: &Env, record: TransferRecord) -> TransferResponse {
    let attestable =
        record.state == TransferState::Pending && env.block.time < record.expires_at;
    TransferResponse {
        id: record.id,
        sender: record.sender,
        source_chain_id: record.source_chain_id,
        dest_chain_id: record.dest_chain_id,
        token_id: record.token_id,
        amount: record.amount,
        state: record.state,
        created_at: record.created_at,
        expires_at: record.expires_at,
        attestation_ref: record.attestation_ref,
        attested_nonce: record.attested_nonce,
        declared_range: record.declared_range,
        attestable,
    }
}

fn load_transfer(deps: Deps, transfer_id: u64) -> StdResult<TransferRecord> {
    TRANSFERS
        .may_load(deps.storage, transfer_id)?
        .ok_or_else(|| StdError::not_found(format!("Transfer {}", transfer_id)))
}

// ============================================================================
// Core Queries
// ============================================================================

/// Query contract configuration.
pub fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(ConfigResponse {
        owner: config.owner,
        verifier: config.verifier,
        encryption_key: config.encryption_key,
        transfer_ttl: config.transfer_ttl,
        max_amount_bits: config.max_amount_bits,
        require_range_proof: config.require_range_proof,
        transfer_count: TRANSFER_COUNT.may_load(deps.storage)?.unwrap_or(0),
    })
}

pub fn query_owner(deps: Deps) -> StdResult<OwnerResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(OwnerResponse {
        owner: config.owner,
    })
}

// ============================================================================
// Registry Queries
// ============================================================================

pub fn query_chain_info(deps: Deps, chain_id: u64) -> StdResult<ChainInfo> {
    CHAINS
        .may_load(deps.storage, chain_id)?
        .ok_or_else(|| StdError::not_found(format!("Chain {}", chain_id)))
}

pub fn query_token_info(deps: Deps, token_id: u64) -> StdResult<TokenInfo> {
    TOKENS
        .may_load(deps.storage, token_id)?
        .ok_or_else(|| StdError::not_found(format!("Token {}", token_id)))
}

/// Query paginated list of chains.
pub fn query_chains(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<ChainsResponse> {
    let start = start_after.map(Bound::exclusive);
    let chains = CHAINS
        .range(deps.storage, start, None, Order::Ascending)
        .take(page_limit(limit))
        .map(|item| item.map(|(_, chain)| chain))
        .collect::<StdResult<Vec<_>>>()?;
    Ok(ChainsResponse { chains })
}

/// Query paginated list of tokens.
pub fn query_tokens(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<TokensResponse> {
    let start = start_after.map(Bound::exclusive);
    let tokens = TOKENS
        .range(deps.storage, start, None, Order::Ascending)
        .take(page_limit(limit))
        .map(|item| item.map(|(_, token)| token))
        .collect::<StdResult<Vec<_>>>()?;
    Ok(TokensResponse { tokens })
}

// ============================================================================
// Transfer Queries
// ============================================================================

pub fn query_transfer(deps: Deps, env: Env, transfer_id: u64) -> StdResult<TransferResponse> {
    let record = load_transfer(deps, transfer_id)?;
    Ok(to_response(&env, record))
}

/// Query paginated list of transfers, oldest first.
pub fn query_transfers(
    deps: Deps,
    env: Env,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<TransfersResponse> {
    let start = start_after.map(Bound::exclusive);
    let transfers = TRANSFERS
        .range(deps.storage, start, None, Order::Ascending)
        .take(page_limit(limit))
        .map(|item| item.map(|(_, record)| to_response(&env, record)))
        .collect::<StdResult<Vec<_>>>()?;
    Ok(TransfersResponse { transfers })
}

/// Query transfers created by `sender`, oldest first.
pub fn query_transfers_by_sender(
    deps: Deps,
    env: Env,
    sender: String,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<TransfersResponse> {
    let sender = deps.api.addr_validate(&sender)?;
    let start = start_after.map(Bound::exclusive);
    let transfers = TRANSFERS_BY_SENDER
        .prefix(&sender)
        .keys(deps.storage, start, None, Order::Ascending)
        .take(page_limit(limit))
        .map(|id| {
            let record = load_transfer(deps, id?)?;
            Ok(to_response(&env, record))
        })
        .collect::<StdResult<Vec<_>>>()?;
    Ok(TransfersResponse { transfers })
}

// ============================================================================
// Attestation Queries
// ============================================================================

pub fn query_nonce_used(deps: Deps, nonce: u64) -> StdResult<NonceUsedResponse> {
    let transfer_id = USED_NONCES.may_load(deps.storage, nonce)?;
    Ok(NonceUsedResponse {
        nonce,
        used: transfer_id.is_some(),
        transfer_id,
    })
}

/// Digest the verifier must sign to attest `transfer_id` with `nonce`.
pub fn query_attestation_digest(
    deps: Deps,
    env: Env,
    transfer_id: u64,
    nonce: u64,
) -> StdResult<AttestationDigestResponse> {
    let record = load_transfer(deps, transfer_id)?;
    let digest = digest_for(env.contract.address.as_str(), &record, nonce);
    Ok(AttestationDigestResponse {
        digest: Binary::from(digest.to_vec()),
        digest_hex: bytes32_to_hex(&digest),
    })
}

// ============================================================================
// Volume / Audit Queries
// ============================================================================

pub fn query_encrypted_volume(deps: Deps, token_id: u64) -> StdResult<EncryptedVolumeResponse> {
    Ok(EncryptedVolumeResponse {
        token_id,
        locked: LOCKED_VOLUME.may_load(deps.storage, token_id)?,
        released: RELEASED_VOLUME.may_load(deps.storage, token_id)?,
    })
}

/// Query the audit log in sequence order.
pub fn query_audit_log(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<AuditLogResponse> {
    let start = start_after.map(Bound::exclusive);
    let entries = AUDIT_LOG
        .range(deps.storage, start, None, Order::Ascending)
        .take(page_limit(limit))
        .map(|item| item.map(|(_, entry)| entry))
        .collect::<StdResult<Vec<_>>>()?;
    Ok(AuditLogResponse { entries })
}
