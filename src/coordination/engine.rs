//! Run orchestration: transfer, pause, then approve and deposit

use super::state::{RunReport, RunState, RunTracker, StepOutcome};
use crate::chain::RpcClient;
use crate::config::{GasPriceStrategy, Settings};
use crate::contract::{ContractDescriptor, ContractSet};
use crate::error::{DepositorError, DepositorResult};
use crate::tx::{
    FeeSnapshot, NonceManager, Randomness, TransactionBuilder, TransactionSender, TransferTarget,
};
use crate::wallet::load_private_key;

use ethers::abi::Token;
use ethers::signers::Signer;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::U256;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Static parameters of a run
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub use_priority_fee: bool,
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Argument of both the approve and the deposit call
    pub amount_of_gasp: U256,
}

impl RunPlan {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            use_priority_fee: settings.chain.gas_price_strategy == GasPriceStrategy::Eip1559,
            min_delay: settings.min_delay(),
            max_delay: settings.max_delay(),
            amount_of_gasp: settings.run.amount_of_gasp,
        }
    }
}

/// Drives one scripted run for the configured account
pub struct RunEngine {
    rpc: Arc<dyn RpcClient>,
    builder: TransactionBuilder,
    sender: TransactionSender,
    contracts: Arc<ContractSet>,
    randomness: Arc<dyn Randomness>,
    plan: RunPlan,
    tracker: RunTracker,
}

impl RunEngine {
    /// Load credentials and contracts. Makes no network calls, so a bad key
    /// file fails before anything reaches the node.
    pub fn bootstrap(
        settings: &Settings,
        rpc: Arc<dyn RpcClient>,
        randomness: Arc<dyn Randomness>,
    ) -> DepositorResult<Self> {
        let chain_id = settings.chain.chain_id;
        let wallet = load_private_key(&settings.wallet.private_key_path, chain_id)?;
        let contracts = Arc::new(ContractSet::load(&settings.contracts)?);

        let builder = TransactionBuilder::new(
            rpc.clone(),
            randomness.clone(),
            wallet.address(),
            chain_id,
            TransferTarget {
                to: settings.contracts.deposit_address,
                call_data: settings.contracts.deposit_call_data.clone(),
            },
        );
        let sender = TransactionSender::new(
            rpc.clone(),
            wallet,
            settings.confirmation_grace(),
            settings.chain.explorer_tx_url.clone(),
        );

        Ok(Self {
            rpc,
            builder,
            sender,
            contracts,
            randomness,
            plan: RunPlan::from_settings(settings),
            tracker: RunTracker::new(),
        })
    }

    /// Execute the full run. Step failures are logged and reported, never raised.
    pub async fn run(&mut self) -> RunReport {
        self.tracker = RunTracker::new();
        info!("Starting run for wallet {:?}", self.sender.wallet_address());

        let transfer = self.transfer_step().await;
        self.tracker.advance_to(RunState::TransferAwaited);

        self.tracker.advance_to(RunState::Delaying);
        let delay = self
            .randomness
            .delay_between(self.plan.min_delay, self.plan.max_delay);
        info!("Sleeping for {} seconds", delay.as_secs());
        tokio::time::sleep(delay).await;

        let (approve, deposit) = self.approve_and_deposit_step().await;
        self.tracker.advance_to(RunState::Done);

        let report = RunReport {
            transfer,
            approve,
            deposit,
            states: self.tracker.visited().to_vec(),
        };
        info!(
            "Run reached {}: {}/3 transactions confirmed",
            self.tracker.current(),
            report.confirmed_count()
        );
        report
    }

    async fn transfer_step(&mut self) -> StepOutcome {
        let tx = match self
            .builder
            .build_transfer_transaction(self.plan.use_priority_fee)
            .await
        {
            Ok(tx) => tx,
            Err(e) => return step_failed("transfer", &e),
        };

        self.submit_and_await(&tx, RunState::TransferSent, RunState::TransferAwaited)
            .await
            .unwrap_or_else(|e| step_failed("transfer", &e))
    }

    /// Approve then deposit under one nonce fetch and one fee reading. An
    /// error in the approve call skips the deposit; an unconfirmed approve
    /// does not.
    async fn approve_and_deposit_step(&mut self) -> (StepOutcome, StepOutcome) {
        let (approve, deposit) = self.approve_then_deposit().await;
        self.tracker.advance_to(RunState::DepositAwaited);
        (approve, deposit)
    }

    async fn approve_then_deposit(&mut self) -> (StepOutcome, StepOutcome) {
        let mut nonces =
            match NonceManager::fetch(self.rpc.as_ref(), self.builder.from_address()).await {
                Ok(nonces) => nonces,
                Err(e) => return (step_failed("approve", &e), StepOutcome::Skipped),
            };
        let fees = match self.builder.fee_snapshot().await {
            Ok(fees) => fees,
            Err(e) => return (step_failed("approve", &e), StepOutcome::Skipped),
        };

        let contracts = self.contracts.clone();
        let amount = Token::Uint(self.plan.amount_of_gasp);

        let approve_args = [Token::Address(contracts.deposit.address()), amount.clone()];
        let approve = match self
            .contract_call(
                &contracts.approve,
                "approve",
                &approve_args,
                nonces.allocate(),
                &fees,
                (RunState::ApproveSent, RunState::ApproveAwaited),
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => return (step_failed("approve", &e), StepOutcome::Skipped),
        };

        self.tracker.advance_to(RunState::ApproveAwaited);

        if !approve.is_confirmed() {
            warn!("Approve not confirmed, sending deposit with nonce {}", nonces.peek());
        }

        let deposit_args = [Token::Address(contracts.approve.address()), amount];
        let deposit = self
            .contract_call(
                &contracts.deposit,
                "deposit",
                &deposit_args,
                nonces.allocate(),
                &fees,
                (RunState::DepositSent, RunState::DepositAwaited),
            )
            .await
            .unwrap_or_else(|e| step_failed("deposit", &e));

        (approve, deposit)
    }

    async fn contract_call(
        &mut self,
        contract: &ContractDescriptor,
        function: &str,
        args: &[Token],
        nonce: U256,
        fees: &FeeSnapshot,
        (sent, awaited): (RunState, RunState),
    ) -> DepositorResult<StepOutcome> {
        let tx = self
            .builder
            .build_contract_call_transaction(contract, function, args, nonce, fees)
            .await?;
        self.submit_and_await(&tx, sent, awaited).await
    }

    async fn submit_and_await(
        &mut self,
        tx: &TypedTransaction,
        sent: RunState,
        awaited: RunState,
    ) -> DepositorResult<StepOutcome> {
        let tx_hash = self.sender.sign_and_submit(tx).await?;
        self.tracker.advance_to(sent);

        let outcome = self.sender.await_confirmation(tx_hash).await;
        self.tracker.advance_to(awaited);

        Ok(StepOutcome::from_confirmation(tx_hash, outcome))
    }
}

fn step_failed(step: &str, err: &DepositorError) -> StepOutcome {
    if err.is_contract_logic() {
        error!("{} step reverted: {}", step, err);
    } else {
        error!("{} step failed: {}", step, err);
    }
    StepOutcome::failed(err)
}
