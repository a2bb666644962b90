//! Transfer validation hook.
//!
//! The attestor signs only what a `TransferValidator` approves. The validator
//! sees the transfer as queried from the bridge together with its decrypted
//! amount; what it checks (source-chain evidence, compliance lists, limits) is
//! up to the deployment.

use crate::TransferView;

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Sign an attestation for the transfer
    Approve,
    /// Never sign; the transfer will expire or be cancelled
    Reject { reason: String },
    /// Not decidable yet (e.g. source evidence not final); retry later
    Defer { reason: String },
}

pub trait TransferValidator {
    fn validate(&self, transfer: &TransferView, amount: u64) -> Verdict;
}

impl<F> TransferValidator for F
where
    F: Fn(&TransferView, u64) -> Verdict,
{
    fn validate(&self, transfer: &TransferView, amount: u64) -> Verdict {
        self(transfer, amount)
    }
}

/// Accepts amounts within `[min, max]`, optionally restricted to some tokens.
#[derive(Debug, Clone)]
pub struct AmountPolicy {
    pub min: u64,
    pub max: u64,
    pub tokens: Option<Vec<u64>>,
}

impl Default for AmountPolicy {
    fn default() -> Self {
        Self {
            min: 1,
            max: u64::MAX,
            tokens: None,
        }
    }
}

impl TransferValidator for AmountPolicy {
    fn validate(&self, transfer: &TransferView, amount: u64) -> Verdict {
        if let Some(tokens) = &self.tokens {
            if !tokens.contains(&transfer.token_id) {
                return Verdict::Reject {
                    reason: format!("token {} not accepted", transfer.token_id),
                };
            }
        }
        if amount < self.min {
            return Verdict::Reject {
                reason: format!("amount below minimum {}", self.min),
            };
        }
        if amount > self.max {
            return Verdict::Reject {
                reason: format!("amount above maximum {}", self.max),
            };
        }
        Verdict::Approve
    }
}
