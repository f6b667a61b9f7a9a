use super::ids::{AccountId, PoolKey};
use crate::utils::constants::DEFAULT_FEE_BPS;
use serde::{Deserialize, Serialize};

/// A liquidity pool: a custodial ledger account holding reserves of a fixed
/// token pair, priced by the constant-product curve at `fee_bps`.
///
/// Reserves are never tracked here; they are a cached projection of the pool
/// account's ledger balances (see the reserve cache).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pool_key: PoolKey,
    account: AccountId,
    token_a: String,
    token_b: String,
    #[serde(default = "default_fee_bps")]
    fee_bps: u32,
}

fn default_fee_bps() -> u32 {
    DEFAULT_FEE_BPS
}

impl Pool {
    pub fn new(
        pool_key: PoolKey,
        account: AccountId,
        token_a: impl Into<String>,
        token_b: impl Into<String>,
        fee_bps: u32,
    ) -> Self {
        Self { pool_key, account, token_a: token_a.into(), token_b: token_b.into(), fee_bps }
    }

    pub fn pool_key(&self) -> &PoolKey {
        &self.pool_key
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Symbol of the pair's A side.
    pub fn token_a(&self) -> &str {
        &self.token_a
    }

    /// Symbol of the pair's B side.
    pub fn token_b(&self) -> &str {
        &self.token_b
    }

    pub fn fee_bps(&self) -> u32 {
        self.fee_bps
    }

    /// Resolve a from/to symbol pair against this pool.
    /// Returns `Some(a_to_b)` when the pair matches, `None` otherwise.
    pub fn direction(&self, from: &str, to: &str) -> Option<bool> {
        if from == self.token_a && to == self.token_b {
            Some(true)
        } else if from == self.token_b && to == self.token_a {
            Some(false)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Pool {
        Pool::new(
            PoolKey::new("hUSD-hEUR"),
            AccountId::new("0.0.5005"),
            "hUSD",
            "hEUR",
            30,
        )
    }

    #[test]
    fn test_direction() {
        let p = pool();
        assert_eq!(p.direction("hUSD", "hEUR"), Some(true));
        assert_eq!(p.direction("hEUR", "hUSD"), Some(false));
        assert_eq!(p.direction("hUSD", "hGBP"), None);
        assert_eq!(p.direction("hUSD", "hUSD"), None);
    }
}
