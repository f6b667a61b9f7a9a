use crate::error::Result;
use crate::registry::AccountId;
use crate::store::json_store;
use crate::utils::now_ms;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
struct FaucetFile {
    // account -> last successful claim, unix ms
    claims: BTreeMap<String, u64>,
}

/// Last-claim timestamps backing the faucet cooldown. Written only after
/// the distribution transaction confirmed, so a failed claim never burns
/// the account's cooldown window.
pub struct FaucetStore {
    path: PathBuf,
    state: RwLock<FaucetFile>,
}

impl FaucetStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = json_store::load_or_default(&path).await?;
        Ok(Self { path, state: RwLock::new(state) })
    }

    /// Unix-ms timestamp of the account's last successful claim, if any.
    pub async fn last_claim_at(&self, account: &AccountId) -> Option<u64> {
        let state = self.state.read().await;
        state.claims.get(account.as_str()).copied()
    }

    pub async fn record_claim(&self, account: &AccountId, at_ms: u64) -> Result<()> {
        let mut state = self.state.write().await;
        state.claims.insert(account.as_str().to_string(), at_ms);
        json_store::save_atomic(&self.path, &*state).await?;
        info!(%account, at_ms, "faucet claim recorded");
        Ok(())
    }

    pub async fn record_claim_now(&self, account: &AccountId) -> Result<u64> {
        let at_ms = now_ms();
        self.record_claim(account, at_ms).await?;
        Ok(at_ms)
    }
}
