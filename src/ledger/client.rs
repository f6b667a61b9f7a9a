use crate::error::{Result, SwapError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum_macros::{Display, EnumString};

use super::transaction::SignedTransaction;

/// Receipt status as reported by the consensus network. A closed set: the
/// only success value is `Success`; everything else is surfaced to the
/// caller verbatim and never retried by the service.
#[derive(
    Clone, Copy, Debug, Display, PartialEq, Eq, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptStatus {
    Success,
    DuplicateTransaction,
    InsufficientTokenBalance,
    InvalidSignature,
    TokenNotAssociatedToAccount,
    InsufficientPayerBalance,
    TransactionExpired,
    Unknown,
}

impl ReceiptStatus {
    pub fn is_success(self) -> bool {
        self == ReceiptStatus::Success
    }
}

/// Outcome of a ledger submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub status: ReceiptStatus,
    pub transaction_id: String,
}

/// Opaque submission seam to the distributed ledger. The real implementation
/// wraps the network SDK; tests substitute a mock.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn submit(&self, tx: &SignedTransaction) -> Result<SubmitReceipt>;
}

/// Submit with a bounded timeout; expiry surfaces as a retryable failure
/// rather than blocking the request indefinitely.
pub async fn submit_with_timeout(
    client: &dyn LedgerClient,
    tx: &SignedTransaction,
    timeout: Duration,
) -> Result<SubmitReceipt> {
    tokio::time::timeout(timeout, client.submit(tx))
        .await
        .map_err(|_| SwapError::RemoteTimeout(timeout))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization_matches_network_form() {
        let serialized = serde_json::to_string(&ReceiptStatus::Success).unwrap();
        assert_eq!(serialized, "\"SUCCESS\"");
        let status: ReceiptStatus = serde_json::from_str("\"DUPLICATE_TRANSACTION\"").unwrap();
        assert_eq!(status, ReceiptStatus::DuplicateTransaction);
    }

    #[test]
    fn test_only_success_is_success() {
        assert!(ReceiptStatus::Success.is_success());
        assert!(!ReceiptStatus::DuplicateTransaction.is_success());
        assert!(!ReceiptStatus::Unknown.is_success());
    }

    #[tokio::test]
    async fn test_submit_timeout() {
        struct StallingClient;

        #[async_trait]
        impl LedgerClient for StallingClient {
            async fn submit(&self, _tx: &SignedTransaction) -> Result<SubmitReceipt> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                unreachable!()
            }
        }

        let tx = crate::ledger::TransferTransaction::new("memo", 5).freeze().unwrap();
        let result =
            submit_with_timeout(&StallingClient, &tx, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(SwapError::RemoteTimeout(_))));
    }
}
