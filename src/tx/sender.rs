//! Signing, broadcast, and confirmation of built transactions

use crate::chain::RpcClient;
use crate::error::{DepositorError, DepositorResult};

use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, H256, U64};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// What a receipt lookup said about a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// Included with success status
    Confirmed,
    /// Included but execution failed
    Reverted,
    /// No receipt yet; still pending or dropped
    NotFound,
    /// The lookup itself failed
    QueryFailed(String),
}

impl ConfirmationOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ConfirmationOutcome::Confirmed)
    }
}

/// Signs with the run's single key and reports outcomes
pub struct TransactionSender {
    rpc: Arc<dyn RpcClient>,
    wallet: LocalWallet,
    /// Wait before the receipt is looked up
    grace: Duration,
    explorer_tx_url: String,
}

impl TransactionSender {
    pub fn new(
        rpc: Arc<dyn RpcClient>,
        wallet: LocalWallet,
        grace: Duration,
        explorer_tx_url: impl Into<String>,
    ) -> Self {
        Self {
            rpc,
            wallet,
            grace,
            explorer_tx_url: explorer_tx_url.into(),
        }
    }

    /// Get wallet address
    pub fn wallet_address(&self) -> Address {
        self.wallet.address()
    }

    /// Sign locally and broadcast; does not wait for inclusion
    pub async fn sign_and_submit(&self, tx: &TypedTransaction) -> DepositorResult<H256> {
        let signature = self
            .wallet
            .sign_transaction(tx)
            .await
            .map_err(|e| DepositorError::Wallet(e.to_string()))?;
        let raw = tx.rlp_signed(&signature);
        info!("Transaction successfully signed");

        let tx_hash = self.rpc.send_raw_transaction(raw).await?;
        info!("Transaction sent: {:?}", tx_hash);
        Ok(tx_hash)
    }

    /// Wait the grace period, then look the receipt up once.
    ///
    /// Lookup failures are logged and reported as an outcome, never raised.
    pub async fn await_confirmation(&self, tx_hash: H256) -> ConfirmationOutcome {
        tokio::time::sleep(self.grace).await;

        match self.rpc.get_transaction_receipt(tx_hash).await {
            Ok(Some(receipt)) if receipt.status == Some(U64::one()) => {
                info!("Transaction hash: {}", self.explorer_link(tx_hash));
                ConfirmationOutcome::Confirmed
            }
            Ok(Some(receipt)) => {
                warn!(
                    "Transaction {:?} failed with status {:?}",
                    tx_hash, receipt.status
                );
                ConfirmationOutcome::Reverted
            }
            Ok(None) => {
                warn!("Transaction with hash {:?} not found.", tx_hash);
                ConfirmationOutcome::NotFound
            }
            Err(e) => {
                error!("Error checking transaction: {}", e);
                ConfirmationOutcome::QueryFailed(e.to_string())
            }
        }
    }

    /// Block explorer URL for `tx_hash`
    pub fn explorer_link(&self, tx_hash: H256) -> String {
        format!("{}/{:?}", self.explorer_tx_url.trim_end_matches('/'), tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockRpcClient;
    use ethers::types::{Eip1559TransactionRequest, TransactionReceipt, U256};
    use tokio::time::Instant;

    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const GRACE: Duration = Duration::from_secs(30);

    fn sender(rpc: MockRpcClient) -> TransactionSender {
        let wallet = TEST_KEY.parse::<LocalWallet>().unwrap().with_chain_id(17000u64);
        TransactionSender::new(Arc::new(rpc), wallet, GRACE, "https://holesky.etherscan.io/tx/")
    }

    fn receipt(status: u64) -> TransactionReceipt {
        TransactionReceipt {
            status: Some(status.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_sign_and_submit_broadcasts_typed_tx() {
        let hash = H256::repeat_byte(0xab);
        let mut rpc = MockRpcClient::new();
        rpc.expect_send_raw_transaction()
            .times(1)
            .withf(|raw| raw.first() == Some(&0x02))
            .returning(move |_| Ok(hash));

        let tx: TypedTransaction = Eip1559TransactionRequest::new()
            .to(Address::repeat_byte(0x01))
            .nonce(0u64)
            .gas(21_000u64)
            .max_fee_per_gas(3u64)
            .max_priority_fee_per_gas(1u64)
            .value(U256::from(10))
            .chain_id(17000u64)
            .into();

        assert_eq!(sender(rpc).sign_and_submit(&tx).await.unwrap(), hash);
    }

    #[tokio::test]
    async fn test_broadcast_failure_propagates() {
        let mut rpc = MockRpcClient::new();
        rpc.expect_send_raw_transaction()
            .returning(|_| Err(DepositorError::Transaction("insufficient funds for gas".into())));

        let tx: TypedTransaction = Eip1559TransactionRequest::new().chain_id(17000u64).into();
        assert!(matches!(
            sender(rpc).sign_and_submit(&tx).await,
            Err(DepositorError::Transaction(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_receipt_not_queried_before_grace() {
        let start = Instant::now();
        let mut rpc = MockRpcClient::new();
        rpc.expect_get_transaction_receipt()
            .times(1)
            .returning(move |_| {
                assert!(start.elapsed() >= GRACE, "receipt queried after {:?}", start.elapsed());
                Ok(Some(receipt(1)))
            });

        let outcome = sender(rpc).await_confirmation(H256::zero()).await;
        assert_eq!(outcome, ConfirmationOutcome::Confirmed);
        assert!(outcome.is_confirmed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsuccessful_lookups_are_not_errors() {
        let mut rpc = MockRpcClient::new();
        let mut calls = 0;
        rpc.expect_get_transaction_receipt()
            .times(3)
            .returning(move |_| {
                calls += 1;
                match calls {
                    1 => Ok(None),
                    2 => Ok(Some(receipt(0))),
                    _ => Err(DepositorError::rpc("eth_getTransactionReceipt", "timeout")),
                }
            });
        let sender = sender(rpc);

        let not_found = sender.await_confirmation(H256::zero()).await;
        let reverted = sender.await_confirmation(H256::zero()).await;
        let failed = sender.await_confirmation(H256::zero()).await;

        assert_eq!(not_found, ConfirmationOutcome::NotFound);
        assert_eq!(reverted, ConfirmationOutcome::Reverted);
        assert!(matches!(failed, ConfirmationOutcome::QueryFailed(_)));
        assert!(![not_found, reverted, failed].iter().any(|o| o.is_confirmed()));
    }

    #[test]
    fn test_explorer_link() {
        let link = sender(MockRpcClient::new()).explorer_link(H256::repeat_byte(0x01));
        assert_eq!(
            link,
            format!("https://holesky.etherscan.io/tx/0x{}", "01".repeat(32))
        );
    }
}
