//! Error types for the depositor

use thiserror::Error;

/// Main error type for the depositor
#[derive(Error, Debug)]
pub enum DepositorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Private key file '{path}' not found")]
    CredentialMissing { path: String },

    #[error("Private key file '{path}' is empty")]
    CredentialEmpty { path: String },

    #[error("{0}")]
    CredentialInvalid(String),

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("RPC error during {method}: {message}")]
    Rpc { method: String, message: String },

    #[error("Gas estimation error: {0}")]
    GasEstimation(String),

    #[error("Contract logic error: {0}")]
    ContractLogic(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl DepositorError {
    /// Classify a failed gas estimation. Nodes report reverted calls through
    /// the estimation error message, so that is the only signal available.
    pub fn from_estimation(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.to_lowercase().contains("revert") {
            DepositorError::ContractLogic(message)
        } else {
            DepositorError::GasEstimation(message)
        }
    }

    pub fn rpc(method: &str, err: impl std::fmt::Display) -> Self {
        DepositorError::Rpc {
            method: method.to_string(),
            message: err.to_string(),
        }
    }

    /// Check if error was raised by contract execution rather than transport
    pub fn is_contract_logic(&self) -> bool {
        matches!(self, DepositorError::ContractLogic(_))
    }

    /// Check if error must stop the process before any network activity
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DepositorError::Config(_)
                | DepositorError::CredentialMissing { .. }
                | DepositorError::CredentialEmpty { .. }
                | DepositorError::CredentialInvalid(_)
                | DepositorError::Abi(_)
        )
    }

    pub fn is_credential(&self) -> bool {
        matches!(
            self,
            DepositorError::CredentialMissing { .. }
                | DepositorError::CredentialEmpty { .. }
                | DepositorError::CredentialInvalid(_)
        )
    }

    /// Log prefix for an error that stopped the process during startup
    pub fn startup_context(&self) -> &'static str {
        if self.is_credential() {
            "Error loading private key"
        } else if self.is_fatal() {
            "Invalid configuration"
        } else {
            "Startup failed"
        }
    }
}

/// Result type for depositor operations
pub type DepositorResult<T> = Result<T, DepositorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimation_revert_is_contract_logic() {
        let err = DepositorError::from_estimation("execution reverted: ERC20: insufficient allowance");
        assert!(err.is_contract_logic());
        assert!(!err.is_fatal());

        let err = DepositorError::from_estimation("connection reset by peer");
        assert!(matches!(err, DepositorError::GasEstimation(_)));
    }

    #[test]
    fn test_credential_errors_are_fatal() {
        let err = DepositorError::CredentialEmpty {
            path: "private_keys.txt".to_string(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "Private key file 'private_keys.txt' is empty");
    }

    #[test]
    fn test_startup_context_names_the_key() {
        let missing = DepositorError::CredentialMissing {
            path: "private_keys.txt".to_string(),
        };
        let invalid = DepositorError::CredentialInvalid("Invalid private key: bad hex".to_string());
        for err in [&missing, &invalid] {
            assert!(err.is_credential());
            assert_eq!(err.startup_context(), "Error loading private key");
        }
        assert_eq!(
            format!("{}: {}", invalid.startup_context(), invalid),
            "Error loading private key: Invalid private key: bad hex"
        );

        let abi = DepositorError::Abi("bad json".to_string());
        assert!(!abi.is_credential());
        assert_eq!(abi.startup_context(), "Invalid configuration");
        assert_eq!(
            DepositorError::rpc("eth_chainId", "refused").startup_context(),
            "Startup failed"
        );
    }
}
