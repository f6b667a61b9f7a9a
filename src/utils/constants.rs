use std::time::Duration;

/// Basis-point denominator used for fees and slippage.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Default pool fee when a pool entry does not set one.
pub const DEFAULT_FEE_BPS: u32 = 30;

/// Default slippage tolerance applied when the caller does not supply one.
pub const DEFAULT_SLIPPAGE_BPS: u32 = 50;

/// Reserve cache freshness window for read-only queries.
pub const DEFAULT_RESERVE_TTL: Duration = Duration::from_millis(1200);

/// Faucet cooldown between successful claims per account.
pub const DEFAULT_FAUCET_COOLDOWN: Duration = Duration::from_secs(24 * 60 * 60);

/// Whole tokens distributed per token per faucet claim.
pub const DEFAULT_FAUCET_AMOUNT_TOKENS: u64 = 20;

/// Abandoned pending entries older than this are swept.
pub const DEFAULT_PENDING_TTL: Duration = Duration::from_secs(30 * 60);

/// Bounded timeout for mirror reads and ledger submissions.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Max transaction fee (whole hbar) set on pool transactions.
pub const MAX_FEE_POOL_TX_HBAR: u64 = 5;

/// Max transaction fee (whole hbar) set on faucet transactions.
pub const MAX_FEE_FAUCET_TX_HBAR: u64 = 10;
