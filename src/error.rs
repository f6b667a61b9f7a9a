use crate::ledger::ReceiptStatus;
use std::time::Duration;

/// Error taxonomy for the control plane.
///
/// The classes map directly onto how a request handler should respond:
/// validation and state errors are rejected before any side effect, ledger
/// errors carry whatever the remote reported, and integrity errors indicate
/// a local invariant was violated and must never be silently corrected.
#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    // Validation: bad or missing input, rejected before any state change
    #[error("amount must be positive")]
    NonPositiveAmount,
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("unknown pool: {0}")]
    UnknownPool(String),
    #[error("unknown token: {0}")]
    UnknownToken(String),
    #[error("unsupported pair {from}->{to} for pool {pool}")]
    UnsupportedPair { pool: String, from: String, to: String },
    #[error("invalid percent {0}, expected 1..=100")]
    InvalidPercent(u32),
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    // State: the pool or position cannot support the request
    #[error("pool {0} is not seeded (zero reserves)")]
    PoolNotSeeded(String),
    #[error("quote rounds to zero")]
    ZeroQuote,
    #[error("insufficient reserve: need {needed}, pool holds {available}")]
    InsufficientReserve { needed: u64, available: u64 },
    #[error("insufficient liquidity units: need {needed}, account holds {held}")]
    InsufficientUnits { needed: u64, held: u64 },

    // NotFound: unknown or already-consumed pending identifier
    #[error("pending transaction not found: {0}")]
    PendingNotFound(String),

    // Ledger: the remote collaborators failed or rejected
    #[error("transaction {tx_id} returned status {status}")]
    LedgerStatus { status: ReceiptStatus, tx_id: String },
    #[error("remote call timed out after {0:?}")]
    RemoteTimeout(Duration),
    #[error("mirror query failed: {0}")]
    Mirror(String),
    #[error("ledger submission failed: {0}")]
    Submission(String),

    // Integrity: a local invariant was violated, fatal for the request
    #[error("integrity violation: {0}")]
    Integrity(String),

    // Faucet gate
    #[error("faucet cooldown active, {remaining_ms} ms remaining")]
    Cooldown { remaining_ms: u64, next_claim_at_ms: u64 },
    #[error("account {account} not associated with tokens: {missing:?}")]
    NotAssociated { account: String, missing: Vec<String> },

    // Plumbing
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Coarse classification used by outer layers to pick a response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    State,
    NotFound,
    Ledger,
    Integrity,
    Internal,
}

impl SwapError {
    pub fn class(&self) -> ErrorClass {
        use SwapError::*;
        match self {
            NonPositiveAmount | MissingField(_) | UnknownPool(_) | UnknownToken(_)
            | UnsupportedPair { .. } | InvalidPercent(_) | InvalidKey(_) => ErrorClass::Validation,
            PoolNotSeeded(_) | ZeroQuote | InsufficientReserve { .. } | InsufficientUnits { .. }
            | Cooldown { .. } | NotAssociated { .. } => ErrorClass::State,
            PendingNotFound(_) => ErrorClass::NotFound,
            LedgerStatus { .. } | RemoteTimeout(_) | Mirror(_) | Submission(_) => ErrorClass::Ledger,
            Integrity(_) => ErrorClass::Integrity,
            Io(_) | Serde(_) => ErrorClass::Internal,
        }
    }

    /// Whether the caller may retry the same request unchanged.
    /// Ledger submissions are never retried by the service itself; a lost
    /// receipt could mean the transaction actually succeeded.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SwapError::RemoteTimeout(_) | SwapError::Mirror(_))
    }
}

pub type Result<T> = std::result::Result<T, SwapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert_eq!(SwapError::NonPositiveAmount.class(), ErrorClass::Validation);
        assert_eq!(SwapError::ZeroQuote.class(), ErrorClass::State);
        assert_eq!(SwapError::PendingNotFound("x".into()).class(), ErrorClass::NotFound);
        assert_eq!(SwapError::Integrity("negative mint".into()).class(), ErrorClass::Integrity);
    }

    #[test]
    fn test_retryable() {
        assert!(SwapError::Mirror("503".into()).is_retryable());
        assert!(!SwapError::Submission("connection reset".into()).is_retryable());
        assert!(!SwapError::ZeroQuote.is_retryable());
    }
}
