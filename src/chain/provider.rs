//! ethers HTTP provider backing [`RpcClient`]

use super::RpcClient;
use crate::error::{DepositorError, DepositorResult};

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use std::time::Duration;
use tracing::debug;

/// Single-endpoint JSON-RPC provider
pub struct ChainProvider {
    chain_id: u64,
    http: Provider<Http>,
}

impl ChainProvider {
    /// Create a provider for `rpc_url`
    pub fn new(rpc_url: &str, chain_id: u64) -> DepositorResult<Self> {
        let http = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| DepositorError::Config(format!("Invalid RPC URL {}: {}", rpc_url, e)))?
            .interval(Duration::from_millis(500));

        debug!("Added HTTP provider for chain {}: {}", chain_id, rpc_url);
        Ok(Self { chain_id, http })
    }

    /// Get chain ID
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

#[async_trait]
impl RpcClient for ChainProvider {
    async fn get_balance(&self, address: Address) -> DepositorResult<U256> {
        self.http
            .get_balance(address, None)
            .await
            .map_err(|e| DepositorError::rpc("eth_getBalance", e))
    }

    async fn get_transaction_count(&self, address: Address) -> DepositorResult<U256> {
        self.http
            .get_transaction_count(address, None)
            .await
            .map_err(|e| DepositorError::rpc("eth_getTransactionCount", e))
    }

    async fn get_gas_price(&self) -> DepositorResult<U256> {
        self.http
            .get_gas_price()
            .await
            .map_err(|e| DepositorError::rpc("eth_gasPrice", e))
    }

    async fn get_max_priority_fee(&self) -> DepositorResult<U256> {
        self.http
            .request::<_, U256>("eth_maxPriorityFeePerGas", ())
            .await
            .map_err(|e| DepositorError::rpc("eth_maxPriorityFeePerGas", e))
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> DepositorResult<U256> {
        self.http
            .estimate_gas(tx, None)
            .await
            .map_err(|e| DepositorError::from_estimation(e.to_string()))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> DepositorResult<H256> {
        let pending = self
            .http
            .send_raw_transaction(raw)
            .await
            .map_err(|e| DepositorError::Transaction(e.to_string()))?;
        Ok(pending.tx_hash())
    }

    async fn get_transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> DepositorResult<Option<TransactionReceipt>> {
        self.http
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| DepositorError::rpc("eth_getTransactionReceipt", e))
    }
}
