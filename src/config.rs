//! Configuration management for the depositor
//!
//! Loads configuration from a TOML file with environment variable substitution.

use crate::error::{DepositorError, DepositorResult};

use anyhow::{Context, Result};
use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Deserializer};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Holesky test network
pub const DEFAULT_CHAIN_ID: u64 = 17000;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub run: RunConfig,
    pub chain: ChainConfig,
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub min_delay_secs: u64,
    pub max_delay_secs: u64,
    /// Amount passed to both the approve and the deposit call
    #[serde(deserialize_with = "deserialize_dec_u256")]
    pub amount_of_gasp: U256,
    #[serde(default = "default_grace_secs")]
    pub confirmation_grace_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    pub rpc_url: String,
    #[serde(default = "default_explorer")]
    pub explorer_tx_url: String,
    #[serde(default)]
    pub gas_price_strategy: GasPriceStrategy,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GasPriceStrategy {
    Legacy,
    #[default]
    Eip1559,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractsConfig {
    pub approve_address: Address,
    pub deposit_address: Address,
    pub abi_path: PathBuf,
    /// Call data identifying the plain deposit action
    #[serde(default = "default_deposit_call_data")]
    pub deposit_call_data: Bytes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    #[serde(default = "default_private_key_path")]
    pub private_key_path: PathBuf,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_path: default_private_key_path(),
        }
    }
}

fn default_grace_secs() -> u64 {
    30
}

fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

fn default_explorer() -> String {
    "https://holesky.etherscan.io/tx".to_string()
}

fn default_deposit_call_data() -> Bytes {
    Bytes::from(vec![0x27, 0x4b, 0x3d, 0xf4])
}

fn default_private_key_path() -> PathBuf {
    PathBuf::from("private_keys.txt")
}

fn deserialize_dec_u256<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(u64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(value) => Ok(U256::from(value)),
        Raw::Text(text) => U256::from_dec_str(text.trim()).map_err(serde::de::Error::custom),
    }
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        let config_path = env::var("DEPOSITOR_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Ok(Self::from_toml_str(&config_str)?)
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml_str(input: &str) -> DepositorResult<Self> {
        let input = substitute_env_vars(input);

        let settings: Settings = toml::from_str(&input)
            .map_err(|e| DepositorError::Config(format!("Failed to parse configuration: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> DepositorResult<()> {
        if self.run.min_delay_secs > self.run.max_delay_secs {
            return Err(DepositorError::Config(format!(
                "min_delay_secs ({}) exceeds max_delay_secs ({})",
                self.run.min_delay_secs, self.run.max_delay_secs
            )));
        }

        if self.chain.rpc_url.trim().is_empty() {
            return Err(DepositorError::Config("rpc_url is empty".to_string()));
        }

        if self.contracts.deposit_call_data.is_empty() {
            tracing::warn!("deposit_call_data is empty - transfer will carry no selector");
        }

        Ok(())
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_secs(self.run.min_delay_secs)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_secs(self.run.max_delay_secs)
    }

    pub fn confirmation_grace(&self) -> Duration {
        Duration::from_secs(self.run.confirmation_grace_secs)
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_value = env::var(&cap[1]).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
