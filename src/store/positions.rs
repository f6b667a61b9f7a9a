use crate::error::{Result, SwapError};
use crate::registry::{AccountId, PoolKey};
use crate::store::json_store;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::info;

/// One account's stake in one pool: cumulative deposits plus currently held
/// ownership units. Units are a claim on a proportional share of the pool's
/// reserves, not a balance of their own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub deposited_a_units: u64,
    pub deposited_b_units: u64,
    pub units: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PositionsFile {
    // account -> pool key -> position
    accounts: BTreeMap<String, BTreeMap<String, Position>>,
    // pool key -> total units outstanding
    total_units: BTreeMap<String, u64>,
}

/// The liquidity ledger: per-(account, pool) positions and per-pool unit
/// totals. `apply_add` and `apply_remove` are the only mutation points and
/// each persists atomically (write-new-then-rename) before returning.
pub struct PositionStore {
    path: PathBuf,
    state: RwLock<PositionsFile>,
}

impl PositionStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = json_store::load_or_default(&path).await?;
        Ok(Self { path, state: RwLock::new(state) })
    }

    pub async fn position(&self, account: &AccountId, pool_key: &PoolKey) -> Position {
        let state = self.state.read().await;
        state
            .accounts
            .get(account.as_str())
            .and_then(|pools| pools.get(pool_key.as_str()))
            .copied()
            .unwrap_or_default()
    }

    pub async fn total_units(&self, pool_key: &PoolKey) -> u64 {
        let state = self.state.read().await;
        state.total_units.get(pool_key.as_str()).copied().unwrap_or(0)
    }

    /// Credit a confirmed deposit: bump the account's cumulative amounts and
    /// units, and the pool's total units, by the amounts recorded at build
    /// time. A non-positive mint is an invariant violation, not user input.
    pub async fn apply_add(
        &self,
        account: &AccountId,
        pool_key: &PoolKey,
        amount_a_units: u64,
        amount_b_units: u64,
        mint_units: u64,
    ) -> Result<Position> {
        if mint_units == 0 {
            return Err(SwapError::Integrity(format!(
                "non-positive mint for {account} in {pool_key}"
            )));
        }

        let mut state = self.state.write().await;
        let position = state
            .accounts
            .entry(account.as_str().to_string())
            .or_default()
            .entry(pool_key.as_str().to_string())
            .or_default();
        position.deposited_a_units = position.deposited_a_units.saturating_add(amount_a_units);
        position.deposited_b_units = position.deposited_b_units.saturating_add(amount_b_units);
        position.units = position.units.saturating_add(mint_units);
        let updated = *position;

        let total = state.total_units.entry(pool_key.as_str().to_string()).or_default();
        *total = total.saturating_add(mint_units);

        json_store::save_atomic(&self.path, &*state).await?;
        info!(%account, pool = %pool_key, mint_units, "liquidity added");
        Ok(updated)
    }

    /// Debit a confirmed withdrawal: burn units from the account and the
    /// pool total (floored at zero, matching the original bookkeeping).
    pub async fn apply_remove(
        &self,
        account: &AccountId,
        pool_key: &PoolKey,
        burn_units: u64,
    ) -> Result<Position> {
        if burn_units == 0 {
            return Err(SwapError::Integrity(format!(
                "non-positive burn for {account} in {pool_key}"
            )));
        }

        let mut state = self.state.write().await;
        let held = state
            .accounts
            .get(account.as_str())
            .and_then(|pools| pools.get(pool_key.as_str()))
            .map(|p| p.units)
            .unwrap_or(0);
        if held < burn_units {
            return Err(SwapError::InsufficientUnits { needed: burn_units, held });
        }

        let position = state
            .accounts
            .entry(account.as_str().to_string())
            .or_default()
            .entry(pool_key.as_str().to_string())
            .or_default();
        position.units -= burn_units;
        let updated = *position;

        let total = state.total_units.entry(pool_key.as_str().to_string()).or_default();
        *total = total.saturating_sub(burn_units);

        json_store::save_atomic(&self.path, &*state).await?;
        info!(%account, pool = %pool_key, burn_units, "liquidity removed");
        Ok(updated)
    }

    /// Sum of all account units for a pool. Diagnostic reconstruction of the
    /// total-units invariant; not enforced structurally.
    pub async fn reconstructed_total(&self, pool_key: &PoolKey) -> u64 {
        let state = self.state.read().await;
        state
            .accounts
            .values()
            .filter_map(|pools| pools.get(pool_key.as_str()))
            .map(|p| p.units)
            .sum()
    }
}
