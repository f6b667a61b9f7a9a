use crate::error::{Result, SwapError};
use crate::registry::{AccountId, TokenId};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;

/// Read-only seam to the remote ledger query service. Balances are
/// eventually consistent with on-ledger state; staleness is expected, not
/// an error.
#[async_trait]
pub trait MirrorClient: Send + Sync {
    /// Current balance of `token` held by `account`, in smallest units.
    /// Zero when the account does not hold (or is not associated with) the
    /// token.
    async fn token_balance(&self, account: &AccountId, token: &TokenId) -> Result<u64>;

    /// The set of tokens the account is associated with.
    async fn associated_tokens(&self, account: &AccountId) -> Result<HashSet<TokenId>>;
}

pub async fn token_balance_with_timeout(
    mirror: &dyn MirrorClient,
    account: &AccountId,
    token: &TokenId,
    timeout: Duration,
) -> Result<u64> {
    tokio::time::timeout(timeout, mirror.token_balance(account, token))
        .await
        .map_err(|_| SwapError::RemoteTimeout(timeout))?
}

pub async fn associated_tokens_with_timeout(
    mirror: &dyn MirrorClient,
    account: &AccountId,
    timeout: Duration,
) -> Result<HashSet<TokenId>> {
    tokio::time::timeout(timeout, mirror.associated_tokens(account))
        .await
        .map_err(|_| SwapError::RemoteTimeout(timeout))?
}
