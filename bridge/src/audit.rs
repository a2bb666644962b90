//! Append-only audit log.
//!
//! Every state change writes one `AuditEntry` under the next sequence number
//! and returns the matching typed event, so the on-chain log and the emitted
//! events always agree. Entries are never updated or removed.

use cosmwasm_std::{Env, Event, StdResult, Storage};

use crate::state::{AuditEntry, AuditKind, TransferState, AUDIT_LOG, AUDIT_SEQ};

impl AuditKind {
    /// Event type; wasm modules see it prefixed as `wasm-<name>`.
    pub fn event_name(&self) -> &'static str {
        match self {
            AuditKind::TransferCreated => "transfer_created",
            AuditKind::TransferAttested => "transfer_attested",
            AuditKind::TransferReleased => "transfer_released",
            AuditKind::TransferExpired => "transfer_expired",
            AuditKind::TransferCancelled => "transfer_cancelled",
            AuditKind::ChainRegistered => "chain_registered",
            AuditKind::ChainUpdated => "chain_updated",
            AuditKind::TokenRegistered => "token_registered",
            AuditKind::TokenUpdated => "token_updated",
            AuditKind::VerifierChanged => "verifier_changed",
            AuditKind::OwnershipTransferred => "ownership_transferred",
            AuditKind::ConfigUpdated => "config_updated",
        }
    }
}

/// Audit entry about a transfer state transition.
pub fn record_transfer(
    storage: &mut dyn Storage,
    env: &Env,
    kind: AuditKind,
    transfer_id: u64,
    state: TransferState,
) -> StdResult<Event> {
    append(storage, env, kind, Some(transfer_id), Some(state), None)
}

/// Audit entry about a registry entry, address or config value.
pub fn record_subject(
    storage: &mut dyn Storage,
    env: &Env,
    kind: AuditKind,
    subject: impl Into<String>,
) -> StdResult<Event> {
    append(storage, env, kind, None, None, Some(subject.into()))
}

fn append(
    storage: &mut dyn Storage,
    env: &Env,
    kind: AuditKind,
    transfer_id: Option<u64>,
    state: Option<TransferState>,
    subject: Option<String>,
) -> StdResult<Event> {
    let seq = AUDIT_SEQ.may_load(storage)?.unwrap_or(0) + 1;
    let entry = AuditEntry {
        seq,
        kind,
        transfer_id,
        state,
        subject,
        timestamp: env.block.time,
        block_height: env.block.height,
    };
    AUDIT_LOG.save(storage, seq, &entry)?;
    AUDIT_SEQ.save(storage, &seq)?;

    let mut event = Event::new(kind.event_name()).add_attribute("seq", seq.to_string());
    if let Some(id) = entry.transfer_id {
        event = event.add_attribute("transfer_id", id.to_string());
    }
    if let Some(state) = entry.state {
        event = event.add_attribute("state", state.as_str());
    }
    if let Some(subject) = entry.subject {
        event = event.add_attribute("subject", subject);
    }
    Ok(event.add_attribute("timestamp", env.block.time.seconds().to_string()))
}
