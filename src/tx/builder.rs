//! Transaction construction for the plain deposit and the contract calls

use super::gas::{FeeQuote, FeeSnapshot, GasEstimator, LEGACY_GAS_LIMIT};
use super::random::Randomness;
use crate::chain::RpcClient;
use crate::contract::ContractDescriptor;
use crate::error::DepositorResult;

use ethers::abi::Token;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Eip1559TransactionRequest, TransactionRequest, U256};
use std::sync::Arc;
use tracing::{debug, info};

/// Fixed parts of the plain deposit transfer
#[derive(Debug, Clone)]
pub struct TransferTarget {
    pub to: Address,
    pub call_data: Bytes,
}

/// Builds unsigned transactions for the account at `from`
pub struct TransactionBuilder {
    rpc: Arc<dyn RpcClient>,
    gas: GasEstimator,
    randomness: Arc<dyn Randomness>,
    from: Address,
    chain_id: u64,
    transfer: TransferTarget,
}

impl TransactionBuilder {
    pub fn new(
        rpc: Arc<dyn RpcClient>,
        randomness: Arc<dyn Randomness>,
        from: Address,
        chain_id: u64,
        transfer: TransferTarget,
    ) -> Self {
        Self {
            gas: GasEstimator::new(rpc.clone()),
            rpc,
            randomness,
            from,
            chain_id,
            transfer,
        }
    }

    pub fn from_address(&self) -> Address {
        self.from
    }

    /// Current base fee and priority fee
    pub async fn fee_snapshot(&self) -> DepositorResult<FeeSnapshot> {
        self.gas.snapshot().await
    }

    /// Random amount in `[0, balance / 4)`; zero when the balance is below 4 wei
    pub async fn compute_transfer_amount(&self) -> DepositorResult<U256> {
        let balance = self.rpc.get_balance(self.from).await?;
        let quarter = balance / 4;

        if quarter.is_zero() {
            debug!("Balance {} too small, transferring nothing", balance);
            return Ok(U256::zero());
        }

        // u128 wei is far above any real balance
        let upper = if quarter > U256::from(u128::MAX) {
            u128::MAX
        } else {
            quarter.as_u128()
        };

        let amount = U256::from(self.randomness.below(upper));
        debug!("Balance {} wei, transfer amount {} wei", balance, amount);
        Ok(amount)
    }

    /// Plain deposit transfer to the fixed target
    pub async fn build_transfer_transaction(
        &self,
        use_priority_fee: bool,
    ) -> DepositorResult<TypedTransaction> {
        let nonce = self.rpc.get_transaction_count(self.from).await?;
        let fees = self.gas.snapshot().await?;
        let value = self.compute_transfer_amount().await?;

        let quote = fees.quote(use_priority_fee);
        let mut tx: TypedTransaction = match quote {
            FeeQuote::Eip1559(priority) => Eip1559TransactionRequest::new()
                .from(self.from)
                .to(self.transfer.to)
                .value(value)
                .max_priority_fee_per_gas(priority.max_priority_fee_per_gas)
                .max_fee_per_gas(priority.max_fee_per_gas)
                .nonce(nonce)
                .data(self.transfer.call_data.clone())
                .chain_id(self.chain_id)
                .into(),
            FeeQuote::Legacy { gas_price } => TransactionRequest::new()
                .from(self.from)
                .to(self.transfer.to)
                .value(value)
                .gas(LEGACY_GAS_LIMIT)
                .gas_price(gas_price)
                .nonce(nonce)
                .data(self.transfer.call_data.clone())
                .chain_id(self.chain_id)
                .into(),
        };

        let gas = self.gas.apply_estimate(&mut tx).await?;

        info!(
            "Built transfer of {} wei with nonce {} (max cost {} wei)",
            value,
            nonce,
            quote.max_cost(gas)
        );
        Ok(tx)
    }

    /// Zero-value priority-fee call to `function` on `contract`.
    ///
    /// `nonce` and `fees` come from the caller so consecutive calls stay in
    /// sequence and share one fee reading.
    pub async fn build_contract_call_transaction(
        &self,
        contract: &ContractDescriptor,
        function: &str,
        args: &[Token],
        nonce: U256,
        fees: &FeeSnapshot,
    ) -> DepositorResult<TypedTransaction> {
        let data = contract.encode_call(function, args)?;
        let fees = fees.priority_fees();

        let mut tx: TypedTransaction = Eip1559TransactionRequest::new()
            .from(self.from)
            .to(contract.address())
            .value(U256::zero())
            .max_priority_fee_per_gas(fees.max_priority_fee_per_gas)
            .max_fee_per_gas(fees.max_fee_per_gas)
            .nonce(nonce)
            .data(data)
            .chain_id(self.chain_id)
            .into();

        let gas = self.gas.apply_estimate(&mut tx).await?;

        info!(
            "Built {}.{} call with nonce {} (max cost {} wei)",
            contract.name(),
            function,
            nonce,
            FeeQuote::Eip1559(fees).max_cost(gas)
        );
        Ok(tx)
    }
}
