//! Chain module - the JSON-RPC seam between the transaction pipeline and a node
//!
//! Everything the pipeline reads from or writes to the network goes through
//! [`RpcClient`], so tests can swap the node for a mock.

pub mod provider;

pub use provider::ChainProvider;

use crate::error::DepositorResult;

use async_trait::async_trait;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionReceipt, H256, U256};

/// Node operations used by the depositor
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Latest balance of `address` in wei
    async fn get_balance(&self, address: Address) -> DepositorResult<U256>;

    /// Number of transactions sent from `address` (the next nonce)
    async fn get_transaction_count(&self, address: Address) -> DepositorResult<U256>;

    /// Current gas price, used as the base fee
    async fn get_gas_price(&self) -> DepositorResult<U256>;

    /// Suggested priority fee per gas
    async fn get_max_priority_fee(&self) -> DepositorResult<U256>;

    /// Estimate gas for `tx`; reverts surface as contract logic errors
    async fn estimate_gas(&self, tx: &TypedTransaction) -> DepositorResult<U256>;

    /// Broadcast a signed transaction and return its hash
    async fn send_raw_transaction(&self, raw: Bytes) -> DepositorResult<H256>;

    /// Receipt for `tx_hash`, `None` while pending or if dropped
    async fn get_transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> DepositorResult<Option<TransactionReceipt>>;
}
