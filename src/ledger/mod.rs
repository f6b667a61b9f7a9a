/// Ledger submission seam
///
/// Wire form of transfer transactions, the service-held signing keys, and
/// the opaque submit trait. Everything here is off-chain bookkeeping: the
/// remote network is the sole verifier of signatures and balances.
pub mod client;
pub mod keys;
pub mod transaction;

pub use client::{LedgerClient, ReceiptStatus, SubmitReceipt, submit_with_timeout};
pub use keys::{KeyFormat, Signature, SigningKey};
pub use transaction::{SignedTransaction, TokenTransfer, TransferTransaction};
