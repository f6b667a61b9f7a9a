use crate::error::{Result, SwapError};
use crate::ledger::{
    LedgerClient, SignedTransaction, SigningKey, SubmitReceipt, submit_with_timeout,
};
use crate::mirror::{ReserveCache, Reserves};
use crate::pricing;
use crate::registry::{AccountId, PoolKey, Registry};
use crate::store::{
    PendingAction, PendingDetails, PendingEntry, PendingStore, Position, PositionStore,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::tx_builder;

/// Outcome of a build step: the pending identifier the caller must echo back
/// at submission, the frozen transaction for the external wallet, and the
/// quoted amounts verbatim.
#[derive(Clone, Debug)]
pub struct BuiltTransaction {
    pub pending_id: String,
    pub transaction_b64: String,
    pub details: PendingDetails,
}

/// Outcome of a confirmed submission.
#[derive(Clone, Debug)]
pub struct SubmitOutcome {
    pub receipt: SubmitReceipt,
    pub action: PendingAction,
    /// Updated position for liquidity actions; `None` for swaps.
    pub position: Option<Position>,
}

/// Orchestrates the build -> externally-sign -> submit -> apply lifecycle.
///
/// Build steps quote against reserves read fresh from the mirror (zero TTL)
/// and record the quote in the pending store; nothing else changes locally.
/// Submission appends the service-held signatures, sends the transaction,
/// and only on a `SUCCESS` receipt applies local effects: consume the
/// pending entry first, then the position ledger, then drop the cached
/// reserves. Consuming first is what makes application at-most-once; a
/// crash in between can only under-apply, never replay.
pub struct LifecycleCoordinator {
    registry: Arc<Registry>,
    reserves: Arc<ReserveCache>,
    pending: Arc<PendingStore>,
    positions: Arc<PositionStore>,
    ledger: Arc<dyn LedgerClient>,
    pool_signer: SigningKey,
    operator_signer: SigningKey,
    remote_timeout: Duration,
    default_slippage_bps: u32,
    // Serializes the consume-then-apply-then-invalidate sequence.
    apply_lock: Mutex<()>,
}

impl LifecycleCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<Registry>,
        reserves: Arc<ReserveCache>,
        pending: Arc<PendingStore>,
        positions: Arc<PositionStore>,
        ledger: Arc<dyn LedgerClient>,
        pool_signer: SigningKey,
        operator_signer: SigningKey,
        remote_timeout: Duration,
        default_slippage_bps: u32,
    ) -> Self {
        Self {
            registry,
            reserves,
            pending,
            positions,
            ledger,
            pool_signer,
            operator_signer,
            remote_timeout,
            default_slippage_bps,
            apply_lock: Mutex::new(()),
        }
    }

    /// Fresh reserves for a pool, bypassing the cache. Every build path
    /// quotes against the ledger's current truth, not a cached projection.
    async fn fresh_reserves(&self, pool_key: &PoolKey) -> Result<Reserves> {
        let pool = self.registry.pool(pool_key)?;
        let (token_a, token_b) = self.registry.pair(pool)?;
        self.reserves
            .get(pool, token_a.token_id(), token_b.token_id(), Duration::ZERO)
            .await
    }

    /// Quote a swap and freeze the transfer for external signing.
    pub async fn build_swap(
        &self,
        pool_key: &PoolKey,
        account: &AccountId,
        from: &str,
        to: &str,
        amount_in: u64,
        slippage_bps: Option<u32>,
    ) -> Result<BuiltTransaction> {
        if amount_in == 0 {
            return Err(SwapError::NonPositiveAmount);
        }
        let leg = self.registry.resolve_leg(pool_key, from, to)?;
        let reserves = self.fresh_reserves(pool_key).await?;
        if !reserves.is_seeded() {
            return Err(SwapError::PoolNotSeeded(pool_key.to_string()));
        }

        let (reserve_in, reserve_out) = reserves.oriented(leg.a_to_b);
        let fee_bps = leg.pool.fee_bps();
        let amount_out = pricing::quote_swap_output(amount_in, reserve_in, reserve_out, fee_bps);
        if amount_out == 0 {
            return Err(SwapError::ZeroQuote);
        }
        if amount_out >= reserve_out {
            return Err(SwapError::InsufficientReserve {
                needed: amount_out,
                available: reserve_out,
            });
        }
        let slippage_bps = slippage_bps.unwrap_or(self.default_slippage_bps);
        let min_out = pricing::apply_slippage(amount_out, slippage_bps);

        let frozen = tx_builder::build_swap(
            pool_key,
            leg.pool.account(),
            account,
            leg.token_in.token_id(),
            leg.token_out.token_id(),
            amount_in,
            amount_out,
        )?;
        let entry = PendingEntry::new(
            pool_key.clone(),
            account.clone(),
            PendingDetails::Swap {
                token_in: leg.token_in.token_id().clone(),
                token_out: leg.token_out.token_id().clone(),
                amount_in_units: amount_in,
                amount_out_units: amount_out,
                min_out_units: min_out,
                fee_bps,
                slippage_bps,
            },
        );
        self.pending.create(entry.clone()).await?;
        info!(
            pool = %pool_key,
            %account,
            amount_in,
            amount_out,
            "swap built"
        );
        Ok(BuiltTransaction {
            pending_id: entry.pending_id,
            transaction_b64: frozen.to_base64()?,
            details: entry.details,
        })
    }

    /// Quote a two-sided deposit and freeze it.
    ///
    /// Once the pool trades, the B amount is derived from the current
    /// reserve ratio so a deposit cannot move the price; the caller-supplied
    /// `amount_b` only applies to the very first deposit, which sets the
    /// ratio.
    pub async fn build_liquidity_add(
        &self,
        pool_key: &PoolKey,
        account: &AccountId,
        amount_a: u64,
        amount_b: Option<u64>,
    ) -> Result<BuiltTransaction> {
        if amount_a == 0 {
            return Err(SwapError::NonPositiveAmount);
        }
        let pool = self.registry.pool(pool_key)?.clone();
        let (token_a, token_b) = self.registry.pair(&pool)?;
        let reserves = self.fresh_reserves(pool_key).await?;
        let total_units = self.positions.total_units(pool_key).await;

        let amount_b = if reserves.is_seeded() && total_units > 0 {
            let derived = amount_a as u128 * reserves.reserve_b as u128
                / reserves.reserve_a as u128;
            if derived == 0 {
                return Err(SwapError::ZeroQuote);
            }
            u64::try_from(derived).map_err(|_| {
                SwapError::Integrity(format!(
                    "derived deposit {derived} for {pool_key} exceeds u64"
                ))
            })?
        } else {
            let supplied = amount_b.ok_or(SwapError::MissingField("amount_b"))?;
            if supplied == 0 {
                return Err(SwapError::NonPositiveAmount);
            }
            supplied
        };

        let mint_exact = pricing::quote_mint_units(
            amount_a,
            amount_b,
            reserves.reserve_a,
            reserves.reserve_b,
            total_units,
        );
        if mint_exact == 0 {
            return Err(SwapError::ZeroQuote);
        }
        let mint_units = u64::try_from(mint_exact).map_err(|_| {
            SwapError::Integrity(format!("mint of {mint_exact} units for {pool_key} exceeds u64"))
        })?;

        let frozen = tx_builder::build_liquidity_add(
            pool_key,
            pool.account(),
            account,
            token_a.token_id(),
            token_b.token_id(),
            amount_a,
            amount_b,
        )?;
        let entry = PendingEntry::new(
            pool_key.clone(),
            account.clone(),
            PendingDetails::LiquidityAdd {
                token_a: token_a.token_id().clone(),
                token_b: token_b.token_id().clone(),
                amount_a_units: amount_a,
                amount_b_units: amount_b,
                mint_units,
            },
        );
        self.pending.create(entry.clone()).await?;
        info!(pool = %pool_key, %account, amount_a, amount_b, mint_units, "liquidity add built");
        Ok(BuiltTransaction {
            pending_id: entry.pending_id,
            transaction_b64: frozen.to_base64()?,
            details: entry.details,
        })
    }

    /// Quote a proportional withdrawal of `percent` of the account's units
    /// and freeze it.
    pub async fn build_liquidity_remove(
        &self,
        pool_key: &PoolKey,
        account: &AccountId,
        percent: u32,
    ) -> Result<BuiltTransaction> {
        if !(1..=100).contains(&percent) {
            return Err(SwapError::InvalidPercent(percent));
        }
        let pool = self.registry.pool(pool_key)?.clone();
        let (token_a, token_b) = self.registry.pair(&pool)?;

        let held = self.positions.position(account, pool_key).await.units;
        let burn_units = (held as u128 * percent as u128 / 100) as u64;
        if burn_units == 0 {
            return Err(SwapError::InsufficientUnits { needed: 1, held });
        }

        let total_units = self.positions.total_units(pool_key).await;
        let reserves = self.fresh_reserves(pool_key).await?;
        if !reserves.is_seeded() {
            return Err(SwapError::PoolNotSeeded(pool_key.to_string()));
        }

        let (out_a, out_b) = pricing::quote_burn_amounts(
            burn_units,
            reserves.reserve_a,
            reserves.reserve_b,
            total_units,
        );
        if out_a == 0 && out_b == 0 {
            return Err(SwapError::ZeroQuote);
        }
        if out_a > reserves.reserve_a {
            return Err(SwapError::InsufficientReserve {
                needed: out_a,
                available: reserves.reserve_a,
            });
        }
        if out_b > reserves.reserve_b {
            return Err(SwapError::InsufficientReserve {
                needed: out_b,
                available: reserves.reserve_b,
            });
        }

        let frozen = tx_builder::build_liquidity_remove(
            pool_key,
            pool.account(),
            account,
            token_a.token_id(),
            token_b.token_id(),
            out_a,
            out_b,
        )?;
        let entry = PendingEntry::new(
            pool_key.clone(),
            account.clone(),
            PendingDetails::LiquidityRemove {
                token_a: token_a.token_id().clone(),
                token_b: token_b.token_id().clone(),
                out_a_units: out_a,
                out_b_units: out_b,
                burn_units,
                percent,
            },
        );
        self.pending.create(entry.clone()).await?;
        info!(pool = %pool_key, %account, percent, burn_units, "liquidity remove built");
        Ok(BuiltTransaction {
            pending_id: entry.pending_id,
            transaction_b64: frozen.to_base64()?,
            details: entry.details,
        })
    }

    /// Submit an externally signed transaction for a pending entry.
    ///
    /// The service appends its own signatures on top of the wallet's: the
    /// pool-custodial key whenever the pool account pays out, the operator
    /// key always (it pays the network fee). A non-success receipt is an
    /// error and leaves the pending entry intact so the caller can rebuild;
    /// the service itself never resubmits.
    pub async fn submit(&self, pending_id: &str, signed_b64: &str) -> Result<SubmitOutcome> {
        let entry = self.pending.get(pending_id).await?;
        let mut tx = SignedTransaction::from_base64(signed_b64)?;

        match entry.action() {
            PendingAction::Swap | PendingAction::LiquidityRemove => {
                tx = tx.sign(&self.pool_signer)?;
            }
            PendingAction::LiquidityAdd => {}
        }
        tx = tx.sign(&self.operator_signer)?;

        let receipt = submit_with_timeout(self.ledger.as_ref(), &tx, self.remote_timeout).await?;
        if !receipt.status.is_success() {
            warn!(
                pending_id,
                status = %receipt.status,
                tx_id = %receipt.transaction_id,
                "submission rejected"
            );
            return Err(SwapError::LedgerStatus {
                status: receipt.status,
                tx_id: receipt.transaction_id,
            });
        }

        let _applying = self.apply_lock.lock().await;
        let entry = self.pending.consume(pending_id).await?;
        let position = match &entry.details {
            PendingDetails::Swap { .. } => None,
            PendingDetails::LiquidityAdd { amount_a_units, amount_b_units, mint_units, .. } => {
                Some(
                    self.positions
                        .apply_add(
                            &entry.account,
                            &entry.pool_key,
                            *amount_a_units,
                            *amount_b_units,
                            *mint_units,
                        )
                        .await?,
                )
            }
            PendingDetails::LiquidityRemove { burn_units, .. } => Some(
                self.positions.apply_remove(&entry.account, &entry.pool_key, *burn_units).await?,
            ),
        };
        self.reserves.invalidate(&entry.pool_key);
        info!(
            pending_id,
            action = %entry.action(),
            tx_id = %receipt.transaction_id,
            "transaction confirmed and applied"
        );
        Ok(SubmitOutcome { receipt, action: entry.action(), position })
    }
}
