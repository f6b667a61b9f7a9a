/// Test-token faucet
///
/// Cooldown-gated distribution of every registered token from the treasury
/// account. A claim checks the cooldown, verifies the claimant associated
/// all tokens on the ledger, submits one operator-signed multi-token
/// transfer, and records the claim timestamp only after the ledger
/// confirms. Failed claims never consume the cooldown window.
use crate::error::{Result, SwapError};
use crate::ledger::{LedgerClient, SigningKey, SubmitReceipt, submit_with_timeout};
use crate::lifecycle::tx_builder;
use crate::mirror::{MirrorClient, associated_tokens_with_timeout};
use crate::registry::{AccountId, Registry};
use crate::store::FaucetStore;
use crate::utils::now_ms;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Snapshot of an account's claim eligibility: the cooldown window plus any
/// tokens the account has not associated yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FaucetStatus {
    pub eligible: bool,
    pub last_claim_at_ms: Option<u64>,
    pub next_claim_at_ms: Option<u64>,
    pub remaining_ms: u64,
    pub missing_tokens: Vec<String>,
}

#[derive(Clone, Copy, Debug)]
struct CooldownView {
    last_claim_at_ms: Option<u64>,
    next_claim_at_ms: Option<u64>,
    remaining_ms: u64,
}

/// Outcome of a successful claim.
#[derive(Clone, Debug)]
pub struct ClaimOutcome {
    pub receipt: SubmitReceipt,
    pub amount_whole_per_token: u64,
    pub token_symbols: Vec<String>,
    pub claimed_at_ms: u64,
}

pub struct FaucetGate {
    registry: Arc<Registry>,
    mirror: Arc<dyn MirrorClient>,
    ledger: Arc<dyn LedgerClient>,
    store: Arc<FaucetStore>,
    operator_signer: SigningKey,
    treasury: AccountId,
    cooldown: Duration,
    amount_whole_per_token: u64,
    remote_timeout: Duration,
    // Serializes check-cooldown -> distribute -> record per process.
    claim_lock: Mutex<()>,
}

impl FaucetGate {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<Registry>,
        mirror: Arc<dyn MirrorClient>,
        ledger: Arc<dyn LedgerClient>,
        store: Arc<FaucetStore>,
        operator_signer: SigningKey,
        treasury: AccountId,
        cooldown: Duration,
        amount_whole_per_token: u64,
        remote_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            mirror,
            ledger,
            store,
            operator_signer,
            treasury,
            cooldown,
            amount_whole_per_token,
            remote_timeout,
            claim_lock: Mutex::new(()),
        }
    }

    fn cooldown_ms(&self) -> u64 {
        self.cooldown.as_millis() as u64
    }

    fn cooldown_view(&self, last_claim_at_ms: Option<u64>, now: u64) -> CooldownView {
        match last_claim_at_ms {
            None => CooldownView {
                last_claim_at_ms: None,
                next_claim_at_ms: None,
                remaining_ms: 0,
            },
            Some(last) => {
                let next = last.saturating_add(self.cooldown_ms());
                CooldownView {
                    last_claim_at_ms: Some(last),
                    next_claim_at_ms: Some(next),
                    remaining_ms: next.saturating_sub(now),
                }
            }
        }
    }

    /// Registered tokens the account has not associated on the ledger,
    /// sorted by symbol.
    async fn missing_associations(&self, account: &AccountId) -> Result<Vec<String>> {
        let associated =
            associated_tokens_with_timeout(self.mirror.as_ref(), account, self.remote_timeout)
                .await?;
        Ok(self
            .registry
            .tokens()
            .iter()
            .filter(|token| !associated.contains(token.token_id()))
            .map(|token| token.symbol().to_string())
            .collect())
    }

    /// Read-only eligibility check; no side effects.
    pub async fn status(&self, account: &AccountId) -> Result<FaucetStatus> {
        let cooldown = self.cooldown_view(self.store.last_claim_at(account).await, now_ms());
        let missing_tokens = self.missing_associations(account).await?;
        Ok(FaucetStatus {
            eligible: cooldown.remaining_ms == 0 && missing_tokens.is_empty(),
            last_claim_at_ms: cooldown.last_claim_at_ms,
            next_claim_at_ms: cooldown.next_claim_at_ms,
            remaining_ms: cooldown.remaining_ms,
            missing_tokens,
        })
    }

    /// Distribute the configured amount of every registered token to the
    /// claimant. The claim timestamp is recorded only after the ledger
    /// confirmed the transfer.
    pub async fn claim(&self, account: &AccountId) -> Result<ClaimOutcome> {
        let _claiming = self.claim_lock.lock().await;

        let cooldown = self.cooldown_view(self.store.last_claim_at(account).await, now_ms());
        if cooldown.remaining_ms > 0 {
            return Err(SwapError::Cooldown {
                remaining_ms: cooldown.remaining_ms,
                next_claim_at_ms: cooldown.next_claim_at_ms.unwrap_or(0),
            });
        }

        let missing = self.missing_associations(account).await?;
        if !missing.is_empty() {
            warn!(%account, ?missing, "faucet claim rejected, tokens not associated");
            return Err(SwapError::NotAssociated {
                account: account.to_string(),
                missing,
            });
        }

        let tx = tx_builder::build_faucet(
            &self.treasury,
            account,
            self.registry.tokens(),
            self.amount_whole_per_token,
        )?
        .sign(&self.operator_signer)?;

        let receipt = submit_with_timeout(self.ledger.as_ref(), &tx, self.remote_timeout).await?;
        if !receipt.status.is_success() {
            return Err(SwapError::LedgerStatus {
                status: receipt.status,
                tx_id: receipt.transaction_id,
            });
        }

        let claimed_at_ms = self.store.record_claim_now(account).await?;
        info!(%account, tx_id = %receipt.transaction_id, "faucet claim distributed");
        Ok(ClaimOutcome {
            receipt,
            amount_whole_per_token: self.amount_whole_per_token,
            token_symbols: self
                .registry
                .tokens()
                .iter()
                .map(|t| t.symbol().to_string())
                .collect(),
            claimed_at_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ReceiptStatus, SignedTransaction};
    use crate::registry::{TokenId, test_fixtures};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct AssocMirror {
        associated: HashSet<TokenId>,
    }

    #[async_trait]
    impl MirrorClient for AssocMirror {
        async fn token_balance(&self, _a: &AccountId, _t: &TokenId) -> Result<u64> {
            Ok(0)
        }
        async fn associated_tokens(&self, _a: &AccountId) -> Result<HashSet<TokenId>> {
            Ok(self.associated.clone())
        }
    }

    struct ScriptedLedger {
        status: ReceiptStatus,
        submissions: AtomicU64,
    }

    #[async_trait]
    impl LedgerClient for ScriptedLedger {
        async fn submit(&self, _tx: &SignedTransaction) -> Result<SubmitReceipt> {
            let n = self.submissions.fetch_add(1, Ordering::Relaxed);
            Ok(SubmitReceipt {
                status: self.status,
                transaction_id: format!("0.0.2@1700000000.{n}"),
            })
        }
    }

    fn both_tokens() -> HashSet<TokenId> {
        [TokenId::new("0.0.1001"), TokenId::new("0.0.1002")].into_iter().collect()
    }

    async fn gate(
        associated: HashSet<TokenId>,
        status: ReceiptStatus,
    ) -> (FaucetGate, Arc<FaucetStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FaucetStore::open(dir.path().join("faucet.json")).await.unwrap());
        let gate = FaucetGate::new(
            Arc::new(test_fixtures::registry()),
            Arc::new(AssocMirror { associated }),
            Arc::new(ScriptedLedger { status, submissions: AtomicU64::new(0) }),
            store.clone(),
            SigningKey::parse(&"cd".repeat(32)).unwrap(),
            AccountId::new("0.0.2"),
            Duration::from_secs(24 * 60 * 60),
            20,
            Duration::from_secs(5),
        );
        (gate, store, dir)
    }

    #[tokio::test]
    async fn test_first_claim_succeeds_and_starts_cooldown() {
        let (gate, _store, _dir) = gate(both_tokens(), ReceiptStatus::Success).await;
        let account = AccountId::new("0.0.7");

        assert!(gate.status(&account).await.unwrap().eligible);
        let outcome = gate.claim(&account).await.unwrap();
        assert_eq!(outcome.amount_whole_per_token, 20);
        assert_eq!(outcome.token_symbols, vec!["hEUR", "hUSD"]);

        let status = gate.status(&account).await.unwrap();
        assert!(!status.eligible);
        assert!(status.remaining_ms > 0);
        assert!(status.missing_tokens.is_empty());
    }

    #[tokio::test]
    async fn test_claim_within_cooldown_rejected() {
        let (gate, store, _dir) = gate(both_tokens(), ReceiptStatus::Success).await;
        let account = AccountId::new("0.0.7");
        store.record_claim(&account, now_ms()).await.unwrap();

        let result = gate.claim(&account).await;
        assert!(matches!(result, Err(SwapError::Cooldown { .. })));
    }

    #[tokio::test]
    async fn test_claim_after_cooldown_elapsed() {
        let (gate, store, _dir) = gate(both_tokens(), ReceiptStatus::Success).await;
        let account = AccountId::new("0.0.7");
        let cooldown_ms = 24 * 60 * 60 * 1000u64;
        store.record_claim(&account, now_ms() - cooldown_ms - 1).await.unwrap();

        assert!(gate.status(&account).await.unwrap().eligible);
        gate.claim(&account).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_association_rejects_without_burning_cooldown() {
        let (gate, _store, _dir) =
            gate([TokenId::new("0.0.1001")].into_iter().collect(), ReceiptStatus::Success).await;
        let account = AccountId::new("0.0.7");

        let status = gate.status(&account).await.unwrap();
        assert!(!status.eligible);
        assert_eq!(status.missing_tokens, vec!["hEUR"]);
        // cooldown itself has not started
        assert_eq!(status.remaining_ms, 0);

        let result = gate.claim(&account).await;
        match result {
            Err(SwapError::NotAssociated { missing, .. }) => {
                assert_eq!(missing, vec!["hEUR"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
        // still no cooldown burned; associating the token unblocks the claim
        assert_eq!(gate.status(&account).await.unwrap().remaining_ms, 0);
    }

    #[tokio::test]
    async fn test_rejected_receipt_keeps_eligibility() {
        let (gate, _store, _dir) =
            gate(both_tokens(), ReceiptStatus::InsufficientPayerBalance).await;
        let account = AccountId::new("0.0.7");

        let result = gate.claim(&account).await;
        assert!(matches!(result, Err(SwapError::LedgerStatus { .. })));
        assert!(gate.status(&account).await.unwrap().eligible);
    }
}
