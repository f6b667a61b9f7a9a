/// Persistence layer
///
/// Three small JSON-file stores sharing one crash-safe write path
/// (serialize to a sibling temp file, fsync, rename): the liquidity
/// position ledger, the pending-transaction table, and the faucet
/// claim log. Each store serializes its own mutations behind an async
/// RwLock and persists before returning.
pub(crate) mod json_store;

pub mod faucet;
pub mod pending;
pub mod positions;

pub use faucet::FaucetStore;
pub use pending::{PendingAction, PendingDetails, PendingEntry, PendingStore, make_pending_id};
pub use positions::{Position, PositionStore};
