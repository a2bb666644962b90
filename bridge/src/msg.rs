//! Message types for the Cosmic Bridge contract
//!
//! Messages and responses that carry an `EncryptedAmount` derive their traits
//! by hand instead of through `cw_serde`, because ciphertexts have no equality.

use common::{EncryptedAmount, RangeProof};
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Binary, Timestamp};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::{AmountRange, AuditEntry, ChainInfo, TokenInfo, TransferState};

// ============================================================================
// Instantiate & Migrate
// ============================================================================

/// Migrate message
#[cw_serde]
pub struct MigrateMsg {}

/// Chain entry registered at instantiation
#[cw_serde]
pub struct ChainInit {
    pub chain_id: u64,
    pub name: String,
    pub symbol: String,
}

/// Token entry registered at instantiation
#[cw_serde]
pub struct TokenInit {
    pub token_id: u64,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

/// Instantiate message
#[cw_serde]
pub struct InstantiateMsg {
    /// Owner address (defaults to the instantiating account)
    pub owner: Option<String>,
    /// Authorized attestation signer, 0x-prefixed 20-byte hex address
    pub verifier: String,
    /// Compressed secp256k1 public key amounts are encrypted under (33 bytes)
    pub encryption_key: Binary,
    /// Transfer TTL in seconds (default 24h)
    pub transfer_ttl_seconds: Option<u64>,
    /// Widest accepted range proof in bits (default 48)
    pub max_amount_bits: Option<u8>,
    /// Reject intents without a range proof (default true)
    pub require_range_proof: Option<bool>,
    /// Initial chains; `None` seeds the default catalog, `Some(vec![])` starts empty
    pub chains: Option<Vec<ChainInit>>,
    /// Initial tokens; `None` seeds the default catalog, `Some(vec![])` starts empty
    pub tokens: Option<Vec<TokenInit>>,
}

// ============================================================================
// Execute Messages
// ============================================================================

/// Proof presented on the destination side to release an attested transfer
#[cw_serde]
pub struct DestinationProof {
    pub transfer_id: u64,
    pub dest_chain_id: u64,
    /// Must equal the transfer's stored attestation reference
    pub attestation_ref: Binary,
}

/// Execute messages
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum ExecuteMsg {
    // ========================================================================
    // Registry (owner only)
    // ========================================================================
    RegisterChain {
        chain_id: u64,
        name: String,
        symbol: String,
    },

    RegisterToken {
        token_id: u64,
        symbol: String,
        name: String,
        decimals: u8,
    },

    /// Enable or disable a chain; existing transfers are unaffected
    SetChainEnabled { chain_id: u64, enabled: bool },

    /// Enable or disable a token; existing transfers are unaffected
    SetTokenEnabled { token_id: u64, enabled: bool },

    // ========================================================================
    // Transfer Ledger
    // ========================================================================
    /// Lock intent with an encrypted amount
    ///
    /// Authorization: Anyone. Response data carries the new transfer id.
    CreateTransfer {
        source_chain_id: u64,
        dest_chain_id: u64,
        token_id: u64,
        amount: EncryptedAmount,
        range_proof: Option<RangeProof>,
    },

    /// Verifier attestation for a pending transfer
    ///
    /// Authorization: Anyone may relay; the signature must recover to the verifier.
    SubmitAttestation {
        transfer_id: u64,
        /// 65-byte `r || s || v` signature over the attestation digest
        signature: Binary,
        nonce: u64,
    },

    /// Release an attested transfer
    ///
    /// Authorization: Anyone holding the matching destination proof.
    Release {
        transfer_id: u64,
        proof: DestinationProof,
    },

    /// Mark a pending transfer expired once its TTL has elapsed
    Expire { transfer_id: u64 },

    /// Cancel a pending transfer (original sender only)
    Cancel { transfer_id: u64 },

    // ========================================================================
    // Admin (owner only)
    // ========================================================================
    TransferOwnership { new_owner: String },

    /// Rotate the attestation signer; pending transfers stay attestable
    SetVerifier { verifier: String },

    /// TTL for transfers created afterwards (0 to 30 days)
    SetTransferTtl { seconds: u64 },

    SetRangeProofPolicy {
        max_amount_bits: u8,
        require_range_proof: bool,
    },
}

// ============================================================================
// Query Messages
// ============================================================================

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ConfigResponse)]
    Config {},

    #[returns(OwnerResponse)]
    Owner {},

    #[returns(ChainInfo)]
    ChainInfo { chain_id: u64 },

    #[returns(TokenInfo)]
    TokenInfo { token_id: u64 },

    #[returns(ChainsResponse)]
    Chains {
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(TokensResponse)]
    Tokens {
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(TransferResponse)]
    Transfer { transfer_id: u64 },

    #[returns(TransfersResponse)]
    Transfers {
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    /// Transfers created by one sender, oldest first
    #[returns(TransfersResponse)]
    TransfersBySender {
        sender: String,
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(NonceUsedResponse)]
    NonceUsed { nonce: u64 },

    /// Digest the verifier must sign to attest `transfer_id` with `nonce`
    #[returns(AttestationDigestResponse)]
    AttestationDigest { transfer_id: u64, nonce: u64 },

    /// Encrypted locked/released totals for a token
    #[returns(EncryptedVolumeResponse)]
    EncryptedVolume { token_id: u64 },

    #[returns(AuditLogResponse)]
    AuditLog {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
}

// ============================================================================
// Query Responses
// ============================================================================

#[cw_serde]
pub struct ConfigResponse {
    pub owner: Addr,
    pub verifier: String,
    pub encryption_key: Binary,
    pub transfer_ttl: u64,
    pub max_amount_bits: u8,
    pub require_range_proof: bool,
    pub transfer_count: u64,
}

#[cw_serde]
pub struct OwnerResponse {
    pub owner: Addr,
}

#[cw_serde]
pub struct ChainsResponse {
    pub chains: Vec<ChainInfo>,
}

#[cw_serde]
pub struct TokensResponse {
    pub tokens: Vec<TokenInfo>,
}

/// Public view of a transfer record
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TransferResponse {
    pub id: u64,
    pub sender: Addr,
    pub source_chain_id: u64,
    pub dest_chain_id: u64,
    pub token_id: u64,
    pub amount: EncryptedAmount,
    pub state: TransferState,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub attestation_ref: Option<Binary>,
    pub attested_nonce: Option<u64>,
    pub declared_range: Option<AmountRange>,
    /// Pending and not past its deadline at query time
    pub attestable: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TransfersResponse {
    pub transfers: Vec<TransferResponse>,
}

#[cw_serde]
pub struct NonceUsedResponse {
    pub nonce: u64,
    pub used: bool,
    /// Transfer attested with this nonce
    pub transfer_id: Option<u64>,
}

#[cw_serde]
pub struct AttestationDigestResponse {
    pub digest: Binary,
    pub digest_hex: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EncryptedVolumeResponse {
    pub token_id: u64,
    pub locked: Option<EncryptedAmount>,
    pub released: Option<EncryptedAmount>,
}

#[cw_serde]
pub struct AuditLogResponse {
    pub entries: Vec<AuditEntry>,
}
