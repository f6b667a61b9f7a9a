use crate::config::ServiceConfig;
use crate::error::{Result, SwapError};
use crate::faucet::{ClaimOutcome, FaucetGate, FaucetStatus};
use crate::ledger::{LedgerClient, SigningKey};
use crate::lifecycle::{BuiltTransaction, LifecycleCoordinator, SubmitOutcome};
use crate::mirror::{MirrorClient, ReserveCache, Reserves};
use crate::pricing;
use crate::registry::{AccountId, Pool, PoolKey, Registry};
use crate::store::{FaucetStore, PendingStore, Position, PositionStore};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Read-only swap quote. Produced from cached reserves; the binding quote is
/// the one recorded when the transaction is built.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct SwapQuote {
    pub amount_in: u64,
    pub amount_out: u64,
    pub min_out: u64,
    pub fee_bps: u32,
    pub slippage_bps: u32,
}

/// Snapshot of one pool for display.
#[derive(Clone, Debug, Serialize)]
pub struct PoolState {
    pub pool_key: PoolKey,
    pub token_a: String,
    pub token_b: String,
    pub fee_bps: u32,
    pub reserve_a: u64,
    pub reserve_b: u64,
    pub total_units: u64,
}

/// An account's stake in one pool, valued at current reserves.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct PositionView {
    pub deposited_a_units: u64,
    pub deposited_b_units: u64,
    pub units: u64,
    pub share_bps: u32,
    /// What a full withdrawal would pay out right now.
    pub withdrawable_a_units: u64,
    pub withdrawable_b_units: u64,
}

/// The service facade: everything an outer transport exposes goes through
/// here. Quotes and views read through the TTL'd reserve cache; anything
/// that will change state is delegated to the lifecycle coordinator, which
/// re-reads reserves fresh.
pub struct SwapService {
    config: ServiceConfig,
    registry: Arc<Registry>,
    reserves: Arc<ReserveCache>,
    positions: Arc<PositionStore>,
    coordinator: LifecycleCoordinator,
    faucet: FaucetGate,
}

impl SwapService {
    pub fn builder(config: ServiceConfig) -> SwapServiceBuilder {
        SwapServiceBuilder::new(config)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn cache_stats(&self) -> &crate::mirror::CacheStats {
        &self.reserves.stats
    }

    async fn cached_reserves(&self, pool: &Pool) -> Result<Reserves> {
        let (token_a, token_b) = self.registry.pair(pool)?;
        self.reserves
            .get(pool, token_a.token_id(), token_b.token_id(), self.config.reserve_ttl())
            .await
    }

    /// Non-binding swap quote from cached reserves.
    pub async fn quote_swap(
        &self,
        pool_key: &PoolKey,
        from: &str,
        to: &str,
        amount_in: u64,
        slippage_bps: Option<u32>,
    ) -> Result<SwapQuote> {
        if amount_in == 0 {
            return Err(SwapError::NonPositiveAmount);
        }
        let leg = self.registry.resolve_leg(pool_key, from, to)?;
        let reserves = self.cached_reserves(&leg.pool).await?;
        if !reserves.is_seeded() {
            return Err(SwapError::PoolNotSeeded(pool_key.to_string()));
        }
        let (reserve_in, reserve_out) = reserves.oriented(leg.a_to_b);
        let amount_out =
            pricing::quote_swap_output(amount_in, reserve_in, reserve_out, leg.pool.fee_bps());
        if amount_out == 0 {
            return Err(SwapError::ZeroQuote);
        }
        let slippage_bps = slippage_bps.unwrap_or(self.config.default_slippage_bps);
        Ok(SwapQuote {
            amount_in,
            amount_out,
            min_out: pricing::apply_slippage(amount_out, slippage_bps),
            fee_bps: leg.pool.fee_bps(),
            slippage_bps,
        })
    }

    /// Current state of one pool.
    pub async fn pool_state(&self, pool_key: &PoolKey) -> Result<PoolState> {
        let pool = self.registry.pool(pool_key)?.clone();
        let reserves = self.cached_reserves(&pool).await?;
        Ok(PoolState {
            pool_key: pool_key.clone(),
            token_a: pool.token_a().to_string(),
            token_b: pool.token_b().to_string(),
            fee_bps: pool.fee_bps(),
            reserve_a: reserves.reserve_a,
            reserve_b: reserves.reserve_b,
            total_units: self.positions.total_units(pool_key).await,
        })
    }

    /// Current state of every registered pool.
    pub async fn pool_states(&self) -> Result<Vec<PoolState>> {
        let mut states = Vec::with_capacity(self.registry.pools_len());
        for pool in self.registry.pools() {
            states.push(self.pool_state(pool.pool_key()).await?);
        }
        states.sort_by(|a, b| a.pool_key.cmp(&b.pool_key));
        Ok(states)
    }

    /// An account's position in a pool, valued at current reserves.
    pub async fn position(
        &self,
        account: &AccountId,
        pool_key: &PoolKey,
    ) -> Result<PositionView> {
        let pool = self.registry.pool(pool_key)?.clone();
        let Position { deposited_a_units, deposited_b_units, units } =
            self.positions.position(account, pool_key).await;
        let total_units = self.positions.total_units(pool_key).await;

        let (withdrawable_a_units, withdrawable_b_units, share_bps) = if units > 0 {
            let reserves = self.cached_reserves(&pool).await?;
            let (out_a, out_b) = pricing::quote_burn_amounts(
                units,
                reserves.reserve_a,
                reserves.reserve_b,
                total_units,
            );
            let share = (units as u128 * 10_000 / total_units as u128) as u32;
            (out_a, out_b, share)
        } else {
            (0, 0, 0)
        };

        Ok(PositionView {
            deposited_a_units,
            deposited_b_units,
            units,
            share_bps,
            withdrawable_a_units,
            withdrawable_b_units,
        })
    }

    // lifecycle pass-throughs

    pub async fn build_swap(
        &self,
        pool_key: &PoolKey,
        account: &AccountId,
        from: &str,
        to: &str,
        amount_in: u64,
        slippage_bps: Option<u32>,
    ) -> Result<BuiltTransaction> {
        self.coordinator.build_swap(pool_key, account, from, to, amount_in, slippage_bps).await
    }

    pub async fn build_liquidity_add(
        &self,
        pool_key: &PoolKey,
        account: &AccountId,
        amount_a: u64,
        amount_b: Option<u64>,
    ) -> Result<BuiltTransaction> {
        self.coordinator.build_liquidity_add(pool_key, account, amount_a, amount_b).await
    }

    pub async fn build_liquidity_remove(
        &self,
        pool_key: &PoolKey,
        account: &AccountId,
        percent: u32,
    ) -> Result<BuiltTransaction> {
        self.coordinator.build_liquidity_remove(pool_key, account, percent).await
    }

    pub async fn submit(&self, pending_id: &str, signed_b64: &str) -> Result<SubmitOutcome> {
        self.coordinator.submit(pending_id, signed_b64).await
    }

    // faucet pass-throughs

    pub async fn faucet_status(&self, account: &AccountId) -> Result<FaucetStatus> {
        self.faucet.status(account).await
    }

    pub async fn faucet_claim(&self, account: &AccountId) -> Result<ClaimOutcome> {
        self.faucet.claim(account).await
    }
}

/// Wires the service together. The registry, mirror and ledger seams are
/// injected; stores open under the configured data directory.
pub struct SwapServiceBuilder {
    config: ServiceConfig,
    registry: Option<Arc<Registry>>,
    mirror: Option<Arc<dyn MirrorClient>>,
    ledger: Option<Arc<dyn LedgerClient>>,
    pool_key: Option<SigningKey>,
    operator_key: Option<SigningKey>,
}

impl SwapServiceBuilder {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            registry: None,
            mirror: None,
            ledger: None,
            pool_key: None,
            operator_key: None,
        }
    }

    /// Inject a registry instead of loading `config.registry_file`.
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_mirror(mut self, mirror: Arc<dyn MirrorClient>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn LedgerClient>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_pool_key(mut self, key: SigningKey) -> Self {
        self.pool_key = Some(key);
        self
    }

    pub fn with_operator_key(mut self, key: SigningKey) -> Self {
        self.operator_key = Some(key);
        self
    }

    pub async fn build(self) -> eyre::Result<SwapService> {
        let config = self.config;
        let registry = match self.registry {
            Some(registry) => registry,
            None => Arc::new(
                Registry::load(config.registry_file.clone())
                    .await
                    .map_err(|e| eyre::eyre!("Failed to load registry: {}", e))?,
            ),
        };
        let mirror = self.mirror.ok_or_else(|| eyre::eyre!("Mirror client not provided"))?;
        let ledger = self.ledger.ok_or_else(|| eyre::eyre!("Ledger client not provided"))?;
        let pool_key = self.pool_key.ok_or_else(|| eyre::eyre!("Pool key not provided"))?;
        let operator_key =
            self.operator_key.ok_or_else(|| eyre::eyre!("Operator key not provided"))?;
        if config.operator_account.is_empty() {
            return Err(eyre::eyre!("Operator account not configured"));
        }

        let data_dir = Path::new(&config.data_dir);
        let positions = Arc::new(PositionStore::open(data_dir.join("positions.json")).await?);
        let pending = Arc::new(
            PendingStore::open(data_dir.join("pending.json"), config.pending_ttl()).await?,
        );
        let faucet_store = Arc::new(FaucetStore::open(data_dir.join("faucet.json")).await?);

        let reserves = Arc::new(ReserveCache::new(mirror.clone(), config.remote_timeout()));

        let coordinator = LifecycleCoordinator::new(
            registry.clone(),
            reserves.clone(),
            pending,
            positions.clone(),
            ledger.clone(),
            pool_key,
            operator_key.clone(),
            config.remote_timeout(),
            config.default_slippage_bps,
        );
        let faucet = FaucetGate::new(
            registry.clone(),
            mirror,
            ledger,
            faucet_store,
            operator_key,
            AccountId::new(config.operator_account.clone()),
            config.faucet_cooldown(),
            config.faucet_amount_tokens,
            config.remote_timeout(),
        );

        info!(
            network = registry.network(),
            pools = registry.pools_len(),
            tokens = registry.tokens().len(),
            "SwapService initialized"
        );
        Ok(SwapService { config, registry, reserves, positions, coordinator, faucet })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ReceiptStatus, SignedTransaction, SubmitReceipt};
    use crate::registry::{TokenId, test_fixtures};
    use async_trait::async_trait;
    use std::collections::HashSet;

    struct FixedMirror;

    #[async_trait]
    impl MirrorClient for FixedMirror {
        async fn token_balance(&self, _a: &AccountId, _token: &TokenId) -> Result<u64> {
            Ok(1_000_000)
        }
        async fn associated_tokens(&self, _a: &AccountId) -> Result<HashSet<TokenId>> {
            Ok(HashSet::new())
        }
    }

    struct OkLedger;

    #[async_trait]
    impl LedgerClient for OkLedger {
        async fn submit(&self, _tx: &SignedTransaction) -> Result<SubmitReceipt> {
            Ok(SubmitReceipt {
                status: ReceiptStatus::Success,
                transaction_id: "0.0.2@1700000000.0".to_string(),
            })
        }
    }

    async fn service(dir: &Path) -> SwapService {
        let config = ServiceConfig {
            data_dir: dir.to_string_lossy().into_owned(),
            operator_account: "0.0.2".to_string(),
            ..ServiceConfig::default()
        };
        SwapService::builder(config)
            .with_registry(Arc::new(test_fixtures::registry()))
            .with_mirror(Arc::new(FixedMirror))
            .with_ledger(Arc::new(OkLedger))
            .with_pool_key(SigningKey::parse(&"ab".repeat(32)).unwrap())
            .with_operator_key(SigningKey::parse(&"cd".repeat(32)).unwrap())
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_builder_requires_all_seams() {
        let result = SwapService::builder(ServiceConfig::default())
            .with_registry(Arc::new(test_fixtures::registry()))
            .build()
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_quote_swap_reads_through_cache() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path()).await;
        let quote = svc
            .quote_swap(&PoolKey::new("hUSD-hEUR"), "hUSD", "hEUR", 10_000, None)
            .await
            .unwrap();
        assert_eq!(quote.amount_out, 9_871);
        assert_eq!(quote.min_out, 9_821);

        svc.quote_swap(&PoolKey::new("hUSD-hEUR"), "hUSD", "hEUR", 10_000, None).await.unwrap();
        assert_eq!(svc.cache_stats().hits.load(std::sync::atomic::Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_pool_state_and_empty_position() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path()).await;
        let key = PoolKey::new("hUSD-hEUR");

        let state = svc.pool_state(&key).await.unwrap();
        assert_eq!(state.reserve_a, 1_000_000);
        assert_eq!(state.total_units, 0);

        let view = svc.position(&AccountId::new("0.0.7"), &key).await.unwrap();
        assert_eq!(view.units, 0);
        assert_eq!(view.withdrawable_a_units, 0);
    }
}
