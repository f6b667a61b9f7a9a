use crate::error::{Result, SwapError};
use crate::ledger::{SignedTransaction, TransferTransaction};
use crate::registry::{AccountId, PoolKey, Token, TokenId};
use crate::utils::constants::{MAX_FEE_FAUCET_TX_HBAR, MAX_FEE_POOL_TX_HBAR};

fn debit(amount: u64) -> Result<i64> {
    let v: i64 = amount
        .try_into()
        .map_err(|_| SwapError::Integrity(format!("transfer amount {amount} exceeds i64")))?;
    Ok(-v)
}

fn credit(amount: u64) -> Result<i64> {
    amount
        .try_into()
        .map_err(|_| SwapError::Integrity(format!("transfer amount {amount} exceeds i64")))
}

/// Frozen swap transfer: the account pays `amount_in` of the input token to
/// the pool, the pool pays `amount_out` of the output token back. Two
/// tokens, four legs, both balanced.
pub fn build_swap(
    pool_key: &PoolKey,
    pool_account: &AccountId,
    account: &AccountId,
    token_in: &TokenId,
    token_out: &TokenId,
    amount_in: u64,
    amount_out: u64,
) -> Result<SignedTransaction> {
    TransferTransaction::new(format!("HashSwap:swap:{pool_key}"), MAX_FEE_POOL_TX_HBAR)
        .add_token_transfer(token_in.clone(), account.clone(), debit(amount_in)?)
        .add_token_transfer(token_in.clone(), pool_account.clone(), credit(amount_in)?)
        .add_token_transfer(token_out.clone(), pool_account.clone(), debit(amount_out)?)
        .add_token_transfer(token_out.clone(), account.clone(), credit(amount_out)?)
        .freeze()
}

/// Frozen two-sided deposit into the pool account.
pub fn build_liquidity_add(
    pool_key: &PoolKey,
    pool_account: &AccountId,
    account: &AccountId,
    token_a: &TokenId,
    token_b: &TokenId,
    amount_a: u64,
    amount_b: u64,
) -> Result<SignedTransaction> {
    TransferTransaction::new(format!("HashSwap:liq:add:{pool_key}"), MAX_FEE_POOL_TX_HBAR)
        .add_token_transfer(token_a.clone(), account.clone(), debit(amount_a)?)
        .add_token_transfer(token_a.clone(), pool_account.clone(), credit(amount_a)?)
        .add_token_transfer(token_b.clone(), account.clone(), debit(amount_b)?)
        .add_token_transfer(token_b.clone(), pool_account.clone(), credit(amount_b)?)
        .freeze()
}

/// Frozen two-sided withdrawal from the pool account.
pub fn build_liquidity_remove(
    pool_key: &PoolKey,
    pool_account: &AccountId,
    account: &AccountId,
    token_a: &TokenId,
    token_b: &TokenId,
    out_a: u64,
    out_b: u64,
) -> Result<SignedTransaction> {
    TransferTransaction::new(format!("HashSwap:liq:remove:{pool_key}"), MAX_FEE_POOL_TX_HBAR)
        .add_token_transfer(token_a.clone(), pool_account.clone(), debit(out_a)?)
        .add_token_transfer(token_a.clone(), account.clone(), credit(out_a)?)
        .add_token_transfer(token_b.clone(), pool_account.clone(), debit(out_b)?)
        .add_token_transfer(token_b.clone(), account.clone(), credit(out_b)?)
        .freeze()
}

/// Frozen faucet distribution: `whole_per_token` of every registered token,
/// paid out of the treasury in one transaction. The faucet's fee cap is
/// higher than the pool cap since a multi-token transfer costs more.
pub fn build_faucet(
    treasury: &AccountId,
    claimant: &AccountId,
    tokens: &[std::sync::Arc<Token>],
    whole_per_token: u64,
) -> Result<SignedTransaction> {
    let mut tx = TransferTransaction::new(
        format!("HashSwap:faucet:{claimant}"),
        MAX_FEE_FAUCET_TX_HBAR,
    );
    for token in tokens {
        let units = token.whole_to_units(whole_per_token);
        tx = tx
            .add_token_transfer(token.token_id().clone(), treasury.clone(), debit(units)?)
            .add_token_transfer(token.token_id().clone(), claimant.clone(), credit(units)?);
    }
    tx.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn ids() -> (PoolKey, AccountId, AccountId, TokenId, TokenId) {
        (
            PoolKey::new("hUSD-hEUR"),
            AccountId::new("0.0.5005"),
            AccountId::new("0.0.7"),
            TokenId::new("0.0.1001"),
            TokenId::new("0.0.1002"),
        )
    }

    #[test]
    fn test_swap_shape() {
        let (pool_key, pool_account, account, token_in, token_out) = ids();
        let frozen = build_swap(
            &pool_key, &pool_account, &account, &token_in, &token_out, 10_000, 9_871,
        )
        .unwrap();
        let tx = frozen.transaction();

        assert_eq!(tx.memo(), "HashSwap:swap:hUSD-hEUR");
        assert_eq!(tx.max_fee_hbar(), 5);
        assert_eq!(tx.transfers().len(), 4);
        assert_eq!(tx.transfers()[0].amount, -10_000);
        assert_eq!(tx.transfers()[3].amount, 9_871);
    }

    #[test]
    fn test_liquidity_memos() {
        let (pool_key, pool_account, account, token_a, token_b) = ids();
        let add = build_liquidity_add(
            &pool_key, &pool_account, &account, &token_a, &token_b, 100, 400,
        )
        .unwrap();
        assert_eq!(add.transaction().memo(), "HashSwap:liq:add:hUSD-hEUR");

        let remove = build_liquidity_remove(
            &pool_key, &pool_account, &account, &token_a, &token_b, 100, 400,
        )
        .unwrap();
        assert_eq!(remove.transaction().memo(), "HashSwap:liq:remove:hUSD-hEUR");
    }

    #[test]
    fn test_faucet_covers_every_token() {
        let tokens = vec![
            Arc::new(Token::new("hUSD", TokenId::new("0.0.1001"), 6)),
            Arc::new(Token::new("hEUR", TokenId::new("0.0.1002"), 6)),
        ];
        let frozen =
            build_faucet(&AccountId::new("0.0.2"), &AccountId::new("0.0.7"), &tokens, 20)
                .unwrap();
        let tx = frozen.transaction();

        assert_eq!(tx.memo(), "HashSwap:faucet:0.0.7");
        assert_eq!(tx.max_fee_hbar(), 10);
        assert_eq!(tx.transfers().len(), 4);
        // 20 whole tokens at 6 decimals
        assert_eq!(tx.transfers()[1].amount, 20_000_000);
    }
}
