//! Admin operations handlers.
//!
//! This module handles:
//! - Ownership transfer
//! - Verifier rotation
//! - Transfer TTL and range-proof policy

use common::{format_evm_address, parse_evm_address};
use cosmwasm_std::{DepsMut, Env, MessageInfo, Response};

use crate::audit::record_subject;
use crate::error::ContractError;
use crate::state::{AuditKind, CONFIG, MAX_TRANSFER_TTL};

/// Normalize a verifier address to its lowercase 0x form.
pub(crate) fn normalize_verifier(verifier: &str) -> Result<String, ContractError> {
    let address = parse_evm_address(verifier).map_err(|e| ContractError::InvalidVerifierAddress {
        reason: e.to_string(),
    })?;
    if address == [0u8; 20] {
        return Err(ContractError::InvalidVerifierAddress {
            reason: "zero address".to_string(),
        });
    }
    Ok(format_evm_address(&address))
}

pub(crate) fn validate_ttl(seconds: u64) -> Result<u64, ContractError> {
    if seconds > MAX_TRANSFER_TTL {
        return Err(ContractError::InvalidTtl {
            seconds,
            max: MAX_TRANSFER_TTL,
        });
    }
    Ok(seconds)
}

pub(crate) fn validate_amount_bits(bits: u8) -> Result<u8, ContractError> {
    if bits == 0 || bits > 64 {
        return Err(ContractError::InvalidAmountBits { bits });
    }
    Ok(bits)
}

// ============================================================================
// Ownership / Verifier
// ============================================================================

/// Hand the owner role to a new address (takes effect immediately).
pub fn execute_transfer_ownership(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    new_owner: String,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    let new_owner = deps.api.addr_validate(&new_owner)?;
    let previous = std::mem::replace(&mut config.owner, new_owner.clone());
    CONFIG.save(deps.storage, &config)?;

    let event = record_subject(
        deps.storage,
        &env,
        AuditKind::OwnershipTransferred,
        new_owner.as_str(),
    )?
    .add_attribute("previous_owner", previous.as_str())
    .add_attribute("new_owner", new_owner.as_str());

    Ok(Response::new()
        .add_attribute("method", "transfer_ownership")
        .add_attribute("new_owner", new_owner.to_string())
        .add_event(event))
}

/// Rotate the attestation signer.
///
/// Pending transfers stay attestable by the new verifier; consumed nonces stay consumed.
pub fn execute_set_verifier(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    verifier: String,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    let verifier = normalize_verifier(&verifier)?;
    let previous = std::mem::replace(&mut config.verifier, verifier.clone());
    CONFIG.save(deps.storage, &config)?;

    let event = record_subject(deps.storage, &env, AuditKind::VerifierChanged, verifier.as_str())?
        .add_attribute("previous_verifier", previous)
        .add_attribute("new_verifier", verifier.as_str());

    Ok(Response::new()
        .add_attribute("method", "set_verifier")
        .add_attribute("verifier", verifier)
        .add_event(event))
}

// ============================================================================
// Policy
// ============================================================================

/// Set the TTL for transfers created from now on (0 to 30 days).
pub fn execute_set_transfer_ttl(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    seconds: u64,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    config.transfer_ttl = validate_ttl(seconds)?;
    CONFIG.save(deps.storage, &config)?;

    let event = record_subject(deps.storage, &env, AuditKind::ConfigUpdated, "transfer_ttl")?
        .add_attribute("value", seconds.to_string());

    Ok(Response::new()
        .add_attribute("method", "set_transfer_ttl")
        .add_attribute("seconds", seconds.to_string())
        .add_event(event))
}

/// Set the accepted range-proof width and whether proofs are mandatory.
pub fn execute_set_range_proof_policy(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    max_amount_bits: u8,
    require_range_proof: bool,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    config.max_amount_bits = validate_amount_bits(max_amount_bits)?;
    config.require_range_proof = require_range_proof;
    CONFIG.save(deps.storage, &config)?;

    let event = record_subject(deps.storage, &env, AuditKind::ConfigUpdated, "range_proof_policy")?
        .add_attribute("max_amount_bits", max_amount_bits.to_string())
        .add_attribute("require_range_proof", require_range_proof.to_string());

    Ok(Response::new()
        .add_attribute("method", "set_range_proof_policy")
        .add_attribute("max_amount_bits", max_amount_bits.to_string())
        .add_attribute("require_range_proof", require_range_proof.to_string())
        .add_event(event))
}
