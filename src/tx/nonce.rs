//! Local nonce sequencing for back-to-back submissions
//!
//! The on-chain count is read once; every later nonce is derived locally so
//! that consecutive transactions sent before confirmation never collide.

use crate::chain::RpcClient;
use crate::error::DepositorResult;

use ethers::types::{Address, U256};
use tracing::debug;

/// Hands out consecutive nonces starting from the on-chain count
#[derive(Debug)]
pub struct NonceManager {
    address: Address,
    next: U256,
}

impl NonceManager {
    /// Read the current transaction count of `address`
    pub async fn fetch(rpc: &dyn RpcClient, address: Address) -> DepositorResult<Self> {
        let next = rpc.get_transaction_count(address).await?;
        debug!("Fetched nonce {} for {:?}", next, address);
        Ok(Self::starting_at(address, next))
    }

    pub fn starting_at(address: Address, next: U256) -> Self {
        Self { address, next }
    }

    /// Take the next nonce and advance the local counter
    pub fn allocate(&mut self) -> U256 {
        let nonce = self.next;
        self.next += U256::one();
        debug!("Allocated nonce {} for {:?}", nonce, self.address);
        nonce
    }

    /// Nonce the next `allocate` will return
    pub fn peek(&self) -> U256 {
        self.next
    }
}
