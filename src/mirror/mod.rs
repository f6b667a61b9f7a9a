/// Mirror query layer
///
/// Read-only view of the remote ledger: token balances and account/token
/// associations, consumed through the `MirrorClient` trait with a bounded
/// timeout, and the short-TTL reserve cache built on top of it.
pub mod client;
pub mod reserve_cache;

pub use client::{MirrorClient, associated_tokens_with_timeout, token_balance_with_timeout};
pub use reserve_cache::{CacheStats, Reserves, ReserveCache};
