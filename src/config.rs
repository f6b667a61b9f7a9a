use crate::utils::constants::{
    DEFAULT_FAUCET_AMOUNT_TOKENS, DEFAULT_FAUCET_COOLDOWN, DEFAULT_PENDING_TTL,
    DEFAULT_REMOTE_TIMEOUT, DEFAULT_RESERVE_TTL, DEFAULT_SLIPPAGE_BPS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the swap service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Path to the token/pool registry TOML file
    pub registry_file: String,
    /// Directory holding the JSON store files
    pub data_dir: String,
    /// Ledger account distributing faucet tokens and paying fees
    pub operator_account: String,
    /// Reserve cache freshness for read-only quotes, in milliseconds
    pub reserve_ttl_ms: u64,
    /// Age at which abandoned pending transactions are swept, in seconds
    pub pending_ttl_secs: u64,
    /// Bounded timeout for mirror and ledger calls, in seconds
    pub remote_timeout_secs: u64,
    /// Cooldown between faucet claims per account, in seconds
    pub faucet_cooldown_secs: u64,
    /// Whole tokens distributed per token per faucet claim
    pub faucet_amount_tokens: u64,
    /// Slippage tolerance applied when a swap request does not set one
    pub default_slippage_bps: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            registry_file: "registry.toml".to_string(),
            data_dir: "data".to_string(),
            operator_account: String::new(),
            reserve_ttl_ms: DEFAULT_RESERVE_TTL.as_millis() as u64,
            pending_ttl_secs: DEFAULT_PENDING_TTL.as_secs(),
            remote_timeout_secs: DEFAULT_REMOTE_TIMEOUT.as_secs(),
            faucet_cooldown_secs: DEFAULT_FAUCET_COOLDOWN.as_secs(),
            faucet_amount_tokens: DEFAULT_FAUCET_AMOUNT_TOKENS,
            default_slippage_bps: DEFAULT_SLIPPAGE_BPS,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables. Private keys are read
    /// separately by the service builder and never pass through this struct.
    pub fn from_env() -> eyre::Result<Self> {
        let mut config = Self::default();

        if let Ok(registry_file) = std::env::var("REGISTRY_FILE") {
            config.registry_file = registry_file;
        }

        if let Ok(data_dir) = std::env::var("DATA_DIR") {
            config.data_dir = data_dir;
        }

        if let Ok(operator_account) = std::env::var("OPERATOR_ACCOUNT_ID") {
            config.operator_account = operator_account;
        }

        if let Ok(ttl_str) = std::env::var("RESERVE_TTL_MS") {
            config.reserve_ttl_ms = ttl_str.parse()
                .map_err(|e| eyre::eyre!("Invalid RESERVE_TTL_MS: {}", e))?;
        }

        if let Ok(ttl_str) = std::env::var("PENDING_TTL_SECS") {
            config.pending_ttl_secs = ttl_str.parse()
                .map_err(|e| eyre::eyre!("Invalid PENDING_TTL_SECS: {}", e))?;
        }

        if let Ok(timeout_str) = std::env::var("REMOTE_TIMEOUT_SECS") {
            config.remote_timeout_secs = timeout_str.parse()
                .map_err(|e| eyre::eyre!("Invalid REMOTE_TIMEOUT_SECS: {}", e))?;
        }

        if let Ok(cooldown_str) = std::env::var("FAUCET_COOLDOWN_SECS") {
            config.faucet_cooldown_secs = cooldown_str.parse()
                .map_err(|e| eyre::eyre!("Invalid FAUCET_COOLDOWN_SECS: {}", e))?;
        }

        if let Ok(amount_str) = std::env::var("FAUCET_AMOUNT_TOKENS") {
            config.faucet_amount_tokens = amount_str.parse()
                .map_err(|e| eyre::eyre!("Invalid FAUCET_AMOUNT_TOKENS: {}", e))?;
        }

        if let Ok(slippage_str) = std::env::var("DEFAULT_SLIPPAGE_BPS") {
            config.default_slippage_bps = slippage_str.parse()
                .map_err(|e| eyre::eyre!("Invalid DEFAULT_SLIPPAGE_BPS: {}", e))?;
        }

        Ok(config)
    }

    pub fn reserve_ttl(&self) -> Duration {
        Duration::from_millis(self.reserve_ttl_ms)
    }

    pub fn pending_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_ttl_secs)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }

    pub fn faucet_cooldown(&self) -> Duration {
        Duration::from_secs(self.faucet_cooldown_secs)
    }
}
