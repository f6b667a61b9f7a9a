use crate::error::{Result, SwapError};
use crate::registry::{AccountId, PoolKey, TokenId};
use crate::store::json_store;
use crate::utils::now_ms;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use strum_macros::{Display, EnumString};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Action kind of a pending transaction.
#[derive(
    Clone, Copy, Debug, Display, PartialEq, Eq, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PendingAction {
    Swap,
    LiquidityAdd,
    LiquidityRemove,
}

/// The numeric facts quoted at build time, kept verbatim so a confirmed
/// submission applies exactly what was signed, never a re-quote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingDetails {
    Swap {
        token_in: TokenId,
        token_out: TokenId,
        amount_in_units: u64,
        amount_out_units: u64,
        min_out_units: u64,
        fee_bps: u32,
        slippage_bps: u32,
    },
    LiquidityAdd {
        token_a: TokenId,
        token_b: TokenId,
        amount_a_units: u64,
        amount_b_units: u64,
        mint_units: u64,
    },
    LiquidityRemove {
        token_a: TokenId,
        token_b: TokenId,
        out_a_units: u64,
        out_b_units: u64,
        burn_units: u64,
        percent: u32,
    },
}

impl PendingDetails {
    pub fn action(&self) -> PendingAction {
        match self {
            PendingDetails::Swap { .. } => PendingAction::Swap,
            PendingDetails::LiquidityAdd { .. } => PendingAction::LiquidityAdd,
            PendingDetails::LiquidityRemove { .. } => PendingAction::LiquidityRemove,
        }
    }
}

/// A built-but-unconfirmed transaction awaiting external signature and
/// submission. Never mutated after creation; consumed exactly once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub pending_id: String,
    pub created_at_ms: u64,
    pub pool_key: PoolKey,
    pub account: AccountId,
    pub details: PendingDetails,
}

impl PendingEntry {
    pub fn new(pool_key: PoolKey, account: AccountId, details: PendingDetails) -> Self {
        let created_at_ms = now_ms();
        let pending_id =
            make_pending_id(&pool_key, &account, details.action(), created_at_ms);
        Self { pending_id, created_at_ms, pool_key, account, details }
    }

    pub fn action(&self) -> PendingAction {
        self.details.action()
    }
}

// Disambiguates builds for the same (pool, account, action) landing in the
// same millisecond; the readable prefix alone is not unique.
static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Pending identifier: the human-readable tuple plus a short digest salted
/// with a per-process sequence number, so concurrent builds for the same
/// tuple never collide.
pub fn make_pending_id(
    pool_key: &PoolKey,
    account: &AccountId,
    action: PendingAction,
    created_at_ms: u64,
) -> String {
    let sequence = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let mut hasher = Sha256::new();
    hasher.update(pool_key.as_str().as_bytes());
    hasher.update(account.as_str().as_bytes());
    hasher.update(action.to_string().as_bytes());
    hasher.update(created_at_ms.to_be_bytes());
    hasher.update(sequence.to_be_bytes());
    let digest = hasher.finalize();
    let short: String = digest[..6].iter().map(|b| format!("{b:02x}")).collect();
    format!("{pool_key}|{account}|{action}|{created_at_ms}|{short}")
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PendingFile {
    items: BTreeMap<String, PendingEntry>,
}

/// Persistent table of pending transactions. Entries created at build time
/// are consumed exactly once at successful submission; abandoned entries
/// age out after `ttl` (swept opportunistically on create).
pub struct PendingStore {
    path: PathBuf,
    state: RwLock<PendingFile>,
    ttl: Duration,
}

impl PendingStore {
    pub async fn open(path: impl Into<PathBuf>, ttl: Duration) -> Result<Self> {
        let path = path.into();
        let state = json_store::load_or_default(&path).await?;
        Ok(Self { path, state: RwLock::new(state), ttl })
    }

    fn is_expired(&self, entry: &PendingEntry, now: u64) -> bool {
        now.saturating_sub(entry.created_at_ms) > self.ttl.as_millis() as u64
    }

    fn sweep_locked(&self, state: &mut PendingFile) -> usize {
        let now = now_ms();
        let ttl_ms = self.ttl.as_millis() as u64;
        let before = state.items.len();
        state.items.retain(|_, e| now.saturating_sub(e.created_at_ms) <= ttl_ms);
        let swept = before - state.items.len();
        if swept > 0 {
            debug!(swept, "expired pending entries swept");
        }
        swept
    }

    /// Drop every entry older than the TTL and persist. Returns the number
    /// of entries removed.
    pub async fn sweep_expired(&self) -> Result<usize> {
        let mut state = self.state.write().await;
        let swept = self.sweep_locked(&mut state);
        if swept > 0 {
            json_store::save_atomic(&self.path, &*state).await?;
        }
        Ok(swept)
    }

    /// Insert a freshly built entry. A colliding identifier is a programming
    /// error. Expired leftovers are swept on the way in.
    pub async fn create(&self, entry: PendingEntry) -> Result<()> {
        let mut state = self.state.write().await;
        self.sweep_locked(&mut state);

        if state.items.contains_key(&entry.pending_id) {
            return Err(SwapError::Integrity(format!(
                "pending id collision: {}",
                entry.pending_id
            )));
        }
        info!(pending_id = %entry.pending_id, action = %entry.action(), "pending entry created");
        state.items.insert(entry.pending_id.clone(), entry);
        json_store::save_atomic(&self.path, &*state).await?;
        Ok(())
    }

    pub async fn get(&self, pending_id: &str) -> Result<PendingEntry> {
        let state = self.state.read().await;
        let entry = state
            .items
            .get(pending_id)
            .ok_or_else(|| SwapError::PendingNotFound(pending_id.to_string()))?;
        if self.is_expired(entry, now_ms()) {
            return Err(SwapError::PendingNotFound(pending_id.to_string()));
        }
        Ok(entry.clone())
    }

    /// Delete and return the entry. Fails `PendingNotFound` when already
    /// consumed, expired, or never created; the caller checks this before
    /// applying any ledger effect, which is what makes application
    /// at-most-once.
    pub async fn consume(&self, pending_id: &str) -> Result<PendingEntry> {
        let mut state = self.state.write().await;
        let entry = state
            .items
            .remove(pending_id)
            .ok_or_else(|| SwapError::PendingNotFound(pending_id.to_string()))?;
        if self.is_expired(&entry, now_ms()) {
            json_store::save_atomic(&self.path, &*state).await?;
            return Err(SwapError::PendingNotFound(pending_id.to_string()));
        }
        json_store::save_atomic(&self.path, &*state).await?;
        debug!(pending_id, "pending entry consumed");
        Ok(entry)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.items.len()
    }
}
