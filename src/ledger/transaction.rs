use crate::error::{Result, SwapError};
use crate::registry::{AccountId, TokenId};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::keys::{Signature, SigningKey};

/// One leg of a multi-party token transfer. Negative amounts debit the
/// account, positive amounts credit it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub token_id: TokenId,
    pub account: AccountId,
    pub amount: i64,
}

/// The unsigned wire form of a ledger transfer transaction: a balanced list
/// of token transfers plus memo and fee cap. This is what gets frozen to
/// bytes, handed to the external wallet, and eventually submitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTransaction {
    transfers: Vec<TokenTransfer>,
    memo: String,
    max_fee_hbar: u64,
}

impl TransferTransaction {
    pub fn new(memo: impl Into<String>, max_fee_hbar: u64) -> Self {
        Self { transfers: Vec::new(), memo: memo.into(), max_fee_hbar }
    }

    pub fn add_token_transfer(mut self, token_id: TokenId, account: AccountId, amount: i64) -> Self {
        self.transfers.push(TokenTransfer { token_id, account, amount });
        self
    }

    pub fn transfers(&self) -> &[TokenTransfer] {
        &self.transfers
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn max_fee_hbar(&self) -> u64 {
        self.max_fee_hbar
    }

    /// Per-token transfer sums must cancel out; an unbalanced transaction is
    /// a bug in the builder, never user input.
    fn check_balanced(&self) -> Result<()> {
        let mut per_token: HashMap<&TokenId, i64> = HashMap::new();
        for transfer in &self.transfers {
            let slot = per_token.entry(&transfer.token_id).or_default();
            *slot = slot.checked_add(transfer.amount).ok_or_else(|| {
                SwapError::Integrity(format!(
                    "transfer sum overflow for token {}",
                    transfer.token_id
                ))
            })?;
        }
        for (token_id, sum) in per_token {
            if sum != 0 {
                return Err(SwapError::Integrity(format!(
                    "unbalanced transfer list for token {token_id}: net {sum}"
                )));
            }
        }
        Ok(())
    }

    /// Freeze the transaction into an unsigned envelope ready for external
    /// signing. Fails on an unbalanced transfer list.
    pub fn freeze(self) -> Result<SignedTransaction> {
        self.check_balanced()?;
        Ok(SignedTransaction { transaction: self, signatures: Vec::new() })
    }
}

/// A frozen transaction plus the signatures accumulated so far. The wallet
/// appends the account holder's signature; the coordinator appends the pool
/// and operator signatures before submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    transaction: TransferTransaction,
    signatures: Vec<Signature>,
}

impl SignedTransaction {
    pub fn transaction(&self) -> &TransferTransaction {
        &self.transaction
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Append this service-held key's signature over the frozen bytes.
    /// Signing twice with the same key is a no-op.
    pub fn sign(mut self, key: &SigningKey) -> Result<Self> {
        let payload = serde_json::to_vec(&self.transaction)?;
        let signature = key.sign(&payload);
        if !self.signatures.iter().any(|s| s.signer == signature.signer) {
            self.signatures.push(signature);
        }
        Ok(self)
    }

    pub fn to_base64(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(BASE64.encode(bytes))
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| SwapError::Submission(format!("invalid transaction bytes: {e}")))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
