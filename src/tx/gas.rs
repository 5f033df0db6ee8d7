//! Fee selection and gas limit estimation

use crate::chain::RpcClient;
use crate::error::DepositorResult;

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::U256;
use std::sync::Arc;
use tracing::debug;

/// Gas limit placed on legacy transfers until the live estimate replaces it
pub const LEGACY_GAS_LIMIT: u64 = 210_000;

/// Priority-fee scheme fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityFees {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

impl PriorityFees {
    /// Max fee is always base fee + priority fee
    pub fn new(base_fee: U256, priority_fee: U256) -> Self {
        Self {
            max_fee_per_gas: base_fee.saturating_add(priority_fee),
            max_priority_fee_per_gas: priority_fee,
        }
    }
}

/// Fee fields of one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeQuote {
    Legacy { gas_price: U256 },
    Eip1559(PriorityFees),
}

impl FeeQuote {
    pub fn eip1559(base_fee: U256, priority_fee: U256) -> Self {
        FeeQuote::Eip1559(PriorityFees::new(base_fee, priority_fee))
    }

    pub fn legacy(gas_price: U256) -> Self {
        FeeQuote::Legacy { gas_price }
    }

    /// Upper bound on what `gas_limit` units can cost, in wei
    pub fn max_cost(&self, gas_limit: U256) -> U256 {
        match self {
            FeeQuote::Legacy { gas_price } => gas_limit.saturating_mul(*gas_price),
            FeeQuote::Eip1559(fees) => gas_limit.saturating_mul(fees.max_fee_per_gas),
        }
    }
}

/// Base fee and priority fee observed at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSnapshot {
    pub base_fee: U256,
    pub priority_fee: U256,
}

impl FeeSnapshot {
    pub fn priority_fees(&self) -> PriorityFees {
        PriorityFees::new(self.base_fee, self.priority_fee)
    }

    pub fn quote(&self, use_priority_fee: bool) -> FeeQuote {
        if use_priority_fee {
            FeeQuote::eip1559(self.base_fee, self.priority_fee)
        } else {
            FeeQuote::legacy(self.base_fee)
        }
    }
}

/// Reads fees and gas estimates from the node
pub struct GasEstimator {
    rpc: Arc<dyn RpcClient>,
}

impl GasEstimator {
    pub fn new(rpc: Arc<dyn RpcClient>) -> Self {
        Self { rpc }
    }

    /// Fetch the current base fee and priority fee
    pub async fn snapshot(&self) -> DepositorResult<FeeSnapshot> {
        let base_fee = self.rpc.get_gas_price().await?;
        let priority_fee = self.rpc.get_max_priority_fee().await?;

        debug!("Fees: base {} wei, priority {} wei", base_fee, priority_fee);
        Ok(FeeSnapshot {
            base_fee,
            priority_fee,
        })
    }

    /// Replace the gas limit of `tx` with a live estimate
    pub async fn apply_estimate(&self, tx: &mut TypedTransaction) -> DepositorResult<U256> {
        let estimated = self.rpc.estimate_gas(tx).await?;
        tx.set_gas(estimated);

        debug!("Estimated gas: {}", estimated);
        Ok(estimated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockRpcClient;
    use crate::error::DepositorError;
    use ethers::types::TransactionRequest;

    #[test]
    fn test_eip1559_max_fee_is_base_plus_priority() {
        let quote = FeeQuote::eip1559(U256::from(30_000_000_000u64), U256::from(2_000_000_000u64));
        assert_eq!(
            quote,
            FeeQuote::Eip1559(PriorityFees {
                max_fee_per_gas: U256::from(32_000_000_000u64),
                max_priority_fee_per_gas: U256::from(2_000_000_000u64),
            })
        );
    }

    #[test]
    fn test_max_fee_never_below_priority_fee() {
        for (base, priority) in [(0u64, 0u64), (0, 5), (7, 0), (u64::MAX, u64::MAX)] {
            let fees = PriorityFees::new(U256::from(base), U256::from(priority));
            assert!(fees.max_fee_per_gas >= fees.max_priority_fee_per_gas);
        }
        let saturated = FeeQuote::eip1559(U256::MAX, U256::one());
        assert_eq!(saturated.max_cost(U256::one()), U256::MAX);
    }

    #[test]
    fn test_snapshot_quote_by_scheme() {
        let snapshot = FeeSnapshot {
            base_fee: U256::from(10),
            priority_fee: U256::from(3),
        };
        assert_eq!(snapshot.quote(false), FeeQuote::legacy(U256::from(10)));
        assert_eq!(snapshot.quote(true).max_cost(U256::from(2)), U256::from(26));
    }

    #[tokio::test]
    async fn test_apply_estimate_overwrites_gas() {
        let mut rpc = MockRpcClient::new();
        rpc.expect_estimate_gas()
            .times(1)
            .returning(|_| Ok(U256::from(46_000)));
        let estimator = GasEstimator::new(Arc::new(rpc));

        let mut tx: TypedTransaction = TransactionRequest::new().gas(LEGACY_GAS_LIMIT).into();
        let gas = estimator.apply_estimate(&mut tx).await.unwrap();

        assert_eq!(gas, U256::from(46_000));
        assert_eq!(tx.gas(), Some(&U256::from(46_000)));
    }

    #[tokio::test]
    async fn test_estimate_revert_propagates() {
        let mut rpc = MockRpcClient::new();
        rpc.expect_estimate_gas()
            .returning(|_| Err(DepositorError::from_estimation("execution reverted")));
        let estimator = GasEstimator::new(Arc::new(rpc));

        let mut tx: TypedTransaction = TransactionRequest::new().into();
        let err = estimator.apply_estimate(&mut tx).await.unwrap_err();
        assert!(err.is_contract_logic());
        assert_eq!(tx.gas(), None);
    }
}
