//! Credential loading for the single signing account

use crate::error::{DepositorError, DepositorResult};

use ethers::signers::{LocalWallet, Signer};
use std::io::ErrorKind;
use std::path::Path;
use tracing::info;

/// Load the private key from `path` and bind it to `chain_id`.
///
/// The file must hold exactly one key; surrounding whitespace is ignored.
pub fn load_private_key(path: &Path, chain_id: u64) -> DepositorResult<LocalWallet> {
    let display = path.display().to_string();

    let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DepositorError::CredentialMissing { path: display.clone() },
        _ => DepositorError::CredentialInvalid(format!("Failed to read {}: {}", display, e)),
    })?;

    let key = contents.trim();
    if key.is_empty() {
        return Err(DepositorError::CredentialEmpty { path: display });
    }

    let wallet = key
        .parse::<LocalWallet>()
        .map_err(|e| DepositorError::CredentialInvalid(format!("Invalid private key: {}", e)))?
        .with_chain_id(chain_id);

    info!("Loaded wallet {:?}", wallet.address());
    Ok(wallet)
}
