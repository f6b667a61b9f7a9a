// Layered control plane for the HashSwap pools
pub mod registry; // Static topology: tokens, pools, custodial accounts
pub mod pricing; // Constant-product math, pure and integer-exact
pub mod mirror; // Read side: mirror queries and the reserve cache
pub mod ledger; // Write side: transactions, keys, submission seam
pub mod store; // Persistence: positions, pending table, faucet log
pub mod lifecycle; // Build -> sign -> submit -> apply pipeline
pub mod faucet; // Cooldown-gated test-token distribution

// Service composition and shared plumbing
pub mod config;
pub mod error;
pub mod service;
pub mod utils;

// Re-export key components from each layer
pub use config::ServiceConfig;
pub use error::{ErrorClass, Result, SwapError};
pub use faucet::{ClaimOutcome, FaucetGate, FaucetStatus};
pub use ledger::{
    LedgerClient, ReceiptStatus, Signature, SignedTransaction, SigningKey, SubmitReceipt,
    TokenTransfer, TransferTransaction,
};
pub use lifecycle::{BuiltTransaction, LifecycleCoordinator, SubmitOutcome};
pub use mirror::{CacheStats, MirrorClient, ReserveCache, Reserves};
pub use registry::{AccountId, Pool, PoolKey, Registry, SwapLeg, Token, TokenId};
pub use service::{PoolState, PositionView, SwapQuote, SwapService, SwapServiceBuilder};
pub use store::{
    FaucetStore, PendingAction, PendingDetails, PendingEntry, PendingStore, Position,
    PositionStore,
};
