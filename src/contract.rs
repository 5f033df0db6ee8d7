//! Contract descriptors and call encoding
//!
//! Both target contracts share one ABI file, loaded once at startup.

use crate::config::ContractsConfig;
use crate::error::{DepositorError, DepositorResult};

use ethers::abi::{Abi, Token};
use ethers::types::{Address, Bytes};
use std::path::Path;
use std::sync::Arc;

/// Address + ABI of one target contract
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
    name: &'static str,
    address: Address,
    abi: Arc<Abi>,
}

impl ContractDescriptor {
    pub fn new(name: &'static str, address: Address, abi: Arc<Abi>) -> Self {
        Self { name, address, abi }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// ABI-encode a call to `function` with `args`
    pub fn encode_call(&self, function: &str, args: &[Token]) -> DepositorResult<Bytes> {
        let function = self.abi.function(function).map_err(|e| {
            DepositorError::Abi(format!("{} contract: {}", self.name, e))
        })?;

        function
            .encode_input(args)
            .map(Bytes::from)
            .map_err(|e| DepositorError::Abi(format!("{}.{}: {}", self.name, function.name, e)))
    }
}

/// The approve and deposit contracts used by the approve+deposit flow
#[derive(Debug, Clone)]
pub struct ContractSet {
    pub approve: ContractDescriptor,
    pub deposit: ContractDescriptor,
}

impl ContractSet {
    /// Load the shared ABI and build both descriptors
    pub fn load(config: &ContractsConfig) -> DepositorResult<Self> {
        let abi = Arc::new(load_abi(&config.abi_path)?);

        Ok(Self {
            approve: ContractDescriptor::new("approve", config.approve_address, abi.clone()),
            deposit: ContractDescriptor::new("deposit", config.deposit_address, abi),
        })
    }
}

/// Read an ABI JSON file
pub fn load_abi(path: &Path) -> DepositorResult<Abi> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| DepositorError::Abi(format!("Failed to read {:?}: {}", path, e)))?;

    serde_json::from_str(&raw)
        .map_err(|e| DepositorError::Abi(format!("Failed to parse {:?}: {}", path, e)))
}
