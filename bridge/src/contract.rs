//! Cosmic Bridge Contract - Entry Points
//!
//! The implementation is modularized into:
//! - `execute/` - Execute message handlers
//! - `query` - Query message handlers
//! - `audit` - Append-only audit log shared by all handlers

use common::EncryptionKey;
use cosmwasm_std::{
    entry_point, to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult,
};
use cw2::set_contract_version;

use crate::error::ContractError;
use crate::execute::{
    default_chains, default_tokens, execute_cancel, execute_create_transfer, execute_expire,
    execute_register_chain, execute_register_token, execute_release, execute_set_chain_enabled,
    execute_set_range_proof_policy, execute_set_token_enabled, execute_set_transfer_ttl,
    execute_set_verifier, execute_submit_attestation, execute_transfer_ownership,
    normalize_verifier, register_chain, register_token, validate_amount_bits, validate_ttl,
};
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query::{
    query_attestation_digest, query_audit_log, query_chain_info, query_chains, query_config,
    query_encrypted_volume, query_nonce_used, query_owner, query_token_info, query_tokens,
    query_transfer, query_transfers, query_transfers_by_sender,
};
use crate::state::{
    Config, CONFIG, CONTRACT_NAME, CONTRACT_VERSION, DEFAULT_MAX_AMOUNT_BITS,
    DEFAULT_TRANSFER_TTL, TRANSFER_COUNT,
};

// ============================================================================
// Instantiate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let owner = match msg.owner {
        Some(owner) => deps.api.addr_validate(&owner)?,
        None => info.sender,
    };
    let verifier = normalize_verifier(&msg.verifier)?;
    let encryption_key = EncryptionKey::from_bytes(msg.encryption_key.as_slice()).map_err(|e| {
        ContractError::InvalidEncryptionKey {
            reason: e.to_string(),
        }
    })?;

    let config = Config {
        owner,
        verifier,
        encryption_key: encryption_key.to_binary(),
        transfer_ttl: validate_ttl(msg.transfer_ttl_seconds.unwrap_or(DEFAULT_TRANSFER_TTL))?,
        max_amount_bits: validate_amount_bits(
            msg.max_amount_bits.unwrap_or(DEFAULT_MAX_AMOUNT_BITS),
        )?,
        require_range_proof: msg.require_range_proof.unwrap_or(true),
    };
    CONFIG.save(deps.storage, &config)?;
    TRANSFER_COUNT.save(deps.storage, &0u64)?;

    // Registry seed (default catalog unless the caller lists its own)
    let chains = msg.chains.unwrap_or_else(default_chains);
    let tokens = msg.tokens.unwrap_or_else(default_tokens);
    let chain_count = chains.len();
    let token_count = tokens.len();

    let mut events = Vec::with_capacity(chain_count + token_count);
    for chain in chains {
        events.push(register_chain(deps.storage, &env, chain)?);
    }
    for token in tokens {
        events.push(register_token(deps.storage, &env, token)?);
    }

    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("owner", config.owner)
        .add_attribute("verifier", config.verifier)
        .add_attribute("transfer_ttl", config.transfer_ttl.to_string())
        .add_attribute("chain_count", chain_count.to_string())
        .add_attribute("token_count", token_count.to_string())
        .add_events(events))
}

// ============================================================================
// Execute
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        // Registry
        ExecuteMsg::RegisterChain {
            chain_id,
            name,
            symbol,
        } => execute_register_chain(deps, env, info, chain_id, name, symbol),
        ExecuteMsg::RegisterToken {
            token_id,
            symbol,
            name,
            decimals,
        } => execute_register_token(deps, env, info, token_id, symbol, name, decimals),
        ExecuteMsg::SetChainEnabled { chain_id, enabled } => {
            execute_set_chain_enabled(deps, env, info, chain_id, enabled)
        }
        ExecuteMsg::SetTokenEnabled { token_id, enabled } => {
            execute_set_token_enabled(deps, env, info, token_id, enabled)
        }

        // Transfer ledger
        ExecuteMsg::CreateTransfer {
            source_chain_id,
            dest_chain_id,
            token_id,
            amount,
            range_proof,
        } => execute_create_transfer(
            deps,
            env,
            info,
            source_chain_id,
            dest_chain_id,
            token_id,
            amount,
            range_proof,
        ),
        ExecuteMsg::SubmitAttestation {
            transfer_id,
            signature,
            nonce,
        } => execute_submit_attestation(deps, env, transfer_id, signature, nonce),
        ExecuteMsg::Release { transfer_id, proof } => {
            execute_release(deps, env, transfer_id, proof)
        }
        ExecuteMsg::Expire { transfer_id } => execute_expire(deps, env, transfer_id),
        ExecuteMsg::Cancel { transfer_id } => execute_cancel(deps, env, info, transfer_id),

        // Admin
        ExecuteMsg::TransferOwnership { new_owner } => {
            execute_transfer_ownership(deps, env, info, new_owner)
        }
        ExecuteMsg::SetVerifier { verifier } => execute_set_verifier(deps, env, info, verifier),
        ExecuteMsg::SetTransferTtl { seconds } => {
            execute_set_transfer_ttl(deps, env, info, seconds)
        }
        ExecuteMsg::SetRangeProofPolicy {
            max_amount_bits,
            require_range_proof,
        } => execute_set_range_proof_policy(deps, env, info, max_amount_bits, require_range_proof),
    }
}

// ============================================================================
// Query
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
        QueryMsg::Owner {} => to_json_binary(&query_owner(deps)?),

        // Registry
        QueryMsg::ChainInfo { chain_id } => to_json_binary(&query_chain_info(deps, chain_id)?),
        QueryMsg::TokenInfo { token_id } => to_json_binary(&query_token_info(deps, token_id)?),
        QueryMsg::Chains { start_after, limit } => {
            to_json_binary(&query_chains(deps, start_after, limit)?)
        }
        QueryMsg::Tokens { start_after, limit } => {
            to_json_binary(&query_tokens(deps, start_after, limit)?)
        }

        // Transfers
        QueryMsg::Transfer { transfer_id } => {
            to_json_binary(&query_transfer(deps, env, transfer_id)?)
        }
        QueryMsg::Transfers { start_after, limit } => {
            to_json_binary(&query_transfers(deps, env, start_after, limit)?)
        }
        QueryMsg::TransfersBySender {
            sender,
            start_after,
            limit,
        } => to_json_binary(&query_transfers_by_sender(
            deps,
            env,
            sender,
            start_after,
            limit,
        )?),

        // Attestation
        QueryMsg::NonceUsed { nonce } => to_json_binary(&query_nonce_used(deps, nonce)?),
        QueryMsg::AttestationDigest { transfer_id, nonce } => {
            to_json_binary(&query_attestation_digest(deps, env, transfer_id, nonce)?)
        }

        // Volume / audit
        QueryMsg::EncryptedVolume { token_id } => {
            to_json_binary(&query_encrypted_volume(deps, token_id)?)
        }
        QueryMsg::AuditLog { start_after, limit } => {
            to_json_binary(&query_audit_log(deps, start_after, limit)?)
        }
    }
}

// ============================================================================
// Migrate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("version", CONTRACT_VERSION))
}
