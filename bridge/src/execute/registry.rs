//! Chain and token registry handlers.
//!
//! Entries are never deleted, only disabled. Disabling affects new intents
//! only; transfers already in the ledger keep resolving their references.

use cosmwasm_std::{DepsMut, Env, Event, MessageInfo, Response, Storage};

use crate::audit::record_subject;
use crate::error::ContractError;
use crate::msg::{ChainInit, TokenInit};
use crate::state::{AuditKind, ChainInfo, TokenInfo, CHAINS, CONFIG, MAX_DECIMALS, TOKENS};

// ============================================================================
// Default Catalog
// ============================================================================

/// Chains seeded when instantiation does not list any.
pub(crate) fn default_chains() -> Vec<ChainInit> {
    [
        (1, "Ethereum", "ETH"),
        (137, "Polygon", "MATIC"),
        (56, "BSC", "BNB"),
        (43114, "Avalanche", "AVAX"),
    ]
    .into_iter()
    .map(|(chain_id, name, symbol)| ChainInit {
        chain_id,
        name: name.to_string(),
        symbol: symbol.to_string(),
    })
    .collect()
}

/// Tokens seeded when instantiation does not list any.
pub(crate) fn default_tokens() -> Vec<TokenInit> {
    [
        (1, "ETH", "Ethereum", 18),
        (2, "USDC", "USD Coin", 6),
        (3, "USDT", "Tether", 6),
        (4, "WBTC", "Wrapped Bitcoin", 8),
    ]
    .into_iter()
    .map(|(token_id, symbol, name, decimals)| TokenInit {
        token_id,
        symbol: symbol.to_string(),
        name: name.to_string(),
        decimals,
    })
    .collect()
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ContractError> {
    if value.trim().is_empty() {
        return Err(ContractError::EmptyField {
            field: field.to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// Chain Management
// ============================================================================

/// Validate and store a new chain, returning its registration event.
pub(crate) fn register_chain(
    storage: &mut dyn Storage,
    env: &Env,
    init: ChainInit,
) -> Result<Event, ContractError> {
    if init.chain_id == 0 {
        return Err(ContractError::InvalidChainId {
            chain_id: init.chain_id,
        });
    }
    require_non_empty("name", &init.name)?;
    require_non_empty("symbol", &init.symbol)?;
    if CHAINS.has(storage, init.chain_id) {
        return Err(ContractError::already_exists("Chain", init.chain_id));
    }

    let chain = ChainInfo {
        chain_id: init.chain_id,
        name: init.name,
        symbol: init.symbol,
        enabled: true,
    };
    CHAINS.save(storage, chain.chain_id, &chain)?;

    let event = record_subject(
        storage,
        env,
        AuditKind::ChainRegistered,
        chain.chain_id.to_string(),
    )?;
    Ok(event
        .add_attribute("name", chain.name)
        .add_attribute("symbol", chain.symbol))
}

/// Register a new chain (owner only).
pub fn execute_register_chain(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    chain_id: u64,
    name: String,
    symbol: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    let event = register_chain(
        deps.storage,
        &env,
        ChainInit {
            chain_id,
            name,
            symbol,
        },
    )?;

    Ok(Response::new()
        .add_attribute("method", "register_chain")
        .add_attribute("chain_id", chain_id.to_string())
        .add_event(event))
}

/// Enable or disable a chain (owner only).
pub fn execute_set_chain_enabled(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    chain_id: u64,
    enabled: bool,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    let mut chain = CHAINS
        .may_load(deps.storage, chain_id)?
        .ok_or_else(|| ContractError::not_found("Chain", chain_id))?;
    chain.enabled = enabled;
    CHAINS.save(deps.storage, chain_id, &chain)?;

    let event = record_subject(deps.storage, &env, AuditKind::ChainUpdated, chain_id.to_string())?
        .add_attribute("enabled", enabled.to_string());

    Ok(Response::new()
        .add_attribute("method", "set_chain_enabled")
        .add_attribute("chain_id", chain_id.to_string())
        .add_attribute("enabled", enabled.to_string())
        .add_event(event))
}

// ============================================================================
// Token Management
// ============================================================================

/// Validate and store a new token, returning its registration event.
pub(crate) fn register_token(
    storage: &mut dyn Storage,
    env: &Env,
    init: TokenInit,
) -> Result<Event, ContractError> {
    if init.token_id == 0 {
        return Err(ContractError::InvalidTokenId {
            token_id: init.token_id,
        });
    }
    if init.decimals > MAX_DECIMALS {
        return Err(ContractError::InvalidDecimals {
            decimals: init.decimals,
        });
    }
    require_non_empty("symbol", &init.symbol)?;
    require_non_empty("name", &init.name)?;
    if TOKENS.has(storage, init.token_id) {
        return Err(ContractError::already_exists("Token", init.token_id));
    }

    let token = TokenInfo {
        token_id: init.token_id,
        symbol: init.symbol,
        name: init.name,
        decimals: init.decimals,
        enabled: true,
    };
    TOKENS.save(storage, token.token_id, &token)?;

    let event = record_subject(
        storage,
        env,
        AuditKind::TokenRegistered,
        token.token_id.to_string(),
    )?;
    Ok(event
        .add_attribute("symbol", token.symbol)
        .add_attribute("decimals", token.decimals.to_string()))
}

/// Register a new token (owner only).
pub fn execute_register_token(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    token_id: u64,
    symbol: String,
    name: String,
    decimals: u8,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    let event = register_token(
        deps.storage,
        &env,
        TokenInit {
            token_id,
            symbol,
            name,
            decimals,
        },
    )?;

    Ok(Response::new()
        .add_attribute("method", "register_token")
        .add_attribute("token_id", token_id.to_string())
        .add_event(event))
}

/// Enable or disable a token (owner only).
pub fn execute_set_token_enabled(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    token_id: u64,
    enabled: bool,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    let mut token = TOKENS
        .may_load(deps.storage, token_id)?
        .ok_or_else(|| ContractError::not_found("Token", token_id))?;
    token.enabled = enabled;
    TOKENS.save(deps.storage, token_id, &token)?;

    let event = record_subject(deps.storage, &env, AuditKind::TokenUpdated, token_id.to_string())?
        .add_attribute("enabled", enabled.to_string());

    Ok(Response::new()
        .add_attribute("method", "set_token_enabled")
        .add_attribute("token_id", token_id.to_string())
        .add_attribute("enabled", enabled.to_string())
        .add_event(event))
}
