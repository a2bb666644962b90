//! State definitions for the Cosmic Bridge contract
//!
//! This module defines the configuration record, the chain/token registry, the
//! transfer ledger with its per-sender index, the consumed-nonce window, the
//! encrypted volume accumulators and the audit log.

use common::EncryptedAmount;
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Binary, Timestamp};
use cw_storage_plus::{Item, Map};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// Core Configuration
// ============================================================================

/// Contract configuration
#[cw_serde]
pub struct Config {
    /// Owner address for registry and verifier management
    pub owner: Addr,
    /// Authorized attestation signer (0x-prefixed lowercase 20-byte address)
    pub verifier: String,
    /// Compressed secp256k1 public key all transfer amounts are encrypted under
    pub encryption_key: Binary,
    /// Seconds a new transfer stays attestable
    pub transfer_ttl: u64,
    /// Widest range proof accepted on create, in bits
    pub max_amount_bits: u8,
    /// Whether intents without a range proof are rejected
    pub require_range_proof: bool,
}

/// Supported chain entry
#[cw_serde]
pub struct ChainInfo {
    pub chain_id: u64,
    pub name: String,
    pub symbol: String,
    pub enabled: bool,
}

/// Supported token entry
#[cw_serde]
pub struct TokenInfo {
    pub token_id: u64,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub enabled: bool,
}

// ============================================================================
// Transfer Ledger
// ============================================================================

#[cw_serde]
#[derive(Copy)]
pub enum TransferState {
    Pending,
    Attested,
    Released,
    Expired,
    Cancelled,
}

impl TransferState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Pending => "pending",
            TransferState::Attested => "attested",
            TransferState::Released => "released",
            TransferState::Expired => "expired",
            TransferState::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for TransferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounds proven for a transfer amount at creation
#[cw_serde]
pub struct AmountRange {
    pub min: u64,
    pub max: u64,
}

/// Bridge transfer intent (ledger aggregate root)
///
/// `EncryptedAmount` has no equality, so neither does the record.
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TransferRecord {
    pub id: u64,
    pub sender: Addr,
    pub source_chain_id: u64,
    pub dest_chain_id: u64,
    pub token_id: u64,
    pub amount: EncryptedAmount,
    pub state: TransferState,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    /// keccak256(digest || r || s) of the accepted attestation
    pub attestation_ref: Option<Binary>,
    /// Nonce consumed by the accepted attestation
    pub attested_nonce: Option<u64>,
    /// Range proven at creation, if a proof was supplied
    pub declared_range: Option<AmountRange>,
    pub updated_at: Timestamp,
}

// ============================================================================
// Audit Log
// ============================================================================

#[cw_serde]
#[derive(Copy)]
pub enum AuditKind {
    TransferCreated,
    TransferAttested,
    TransferReleased,
    TransferExpired,
    TransferCancelled,
    ChainRegistered,
    ChainUpdated,
    TokenRegistered,
    TokenUpdated,
    VerifierChanged,
    OwnershipTransferred,
    ConfigUpdated,
}

/// One append-only audit log entry
#[cw_serde]
pub struct AuditEntry {
    pub seq: u64,
    pub kind: AuditKind,
    pub transfer_id: Option<u64>,
    pub state: Option<TransferState>,
    /// Chain id, token id or address the entry is about, when not a transfer
    pub subject: Option<String>,
    pub timestamp: Timestamp,
    pub block_height: u64,
}

// ============================================================================
// Storage Keys
// ============================================================================

pub const CONTRACT_NAME: &str = "crates.io:cosmic-bridge";
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default transfer TTL: 24 hours
pub const DEFAULT_TRANSFER_TTL: u64 = 86_400;
/// Upper bound for SetTransferTtl: 30 days
pub const MAX_TRANSFER_TTL: u64 = 2_592_000;
pub const DEFAULT_MAX_AMOUNT_BITS: u8 = 48;
pub const MAX_DECIMALS: u8 = 18;

pub const CONFIG: Item<Config> = Item::new("config");

/// Chains by chain id
pub const CHAINS: Map<u64, ChainInfo> = Map::new("chains");

/// Tokens by token id
pub const TOKENS: Map<u64, TokenInfo> = Map::new("tokens");

/// Transfers by id
pub const TRANSFERS: Map<u64, TransferRecord> = Map::new("transfers");

/// Per-sender transfer index: (sender, id) -> true
pub const TRANSFERS_BY_SENDER: Map<(&Addr, u64), bool> = Map::new("transfers_by_sender");

/// Last assigned transfer id (0 before the first transfer)
pub const TRANSFER_COUNT: Item<u64> = Item::new("transfer_count");

/// Consumed attestation nonces -> transfer id they attested
pub const USED_NONCES: Map<u64, u64> = Map::new("used_nonces");

/// Homomorphic sum of every created transfer amount, per token
pub const LOCKED_VOLUME: Map<u64, EncryptedAmount> = Map::new("locked_volume");

/// Homomorphic sum of every released transfer amount, per token
pub const RELEASED_VOLUME: Map<u64, EncryptedAmount> = Map::new("released_volume");

pub const AUDIT_LOG: Map<u64, AuditEntry> = Map::new("audit_log");

/// Last assigned audit sequence number
pub const AUDIT_SEQ: Item<u64> = Item::new("audit_seq");
