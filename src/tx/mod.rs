//! Transaction pipeline: fees, nonces, construction, signing, and confirmation

mod builder;
mod gas;
mod nonce;
mod random;
mod sender;

pub use builder::{TransactionBuilder, TransferTarget};
pub use gas::FeeSnapshot;
pub use nonce::NonceManager;
pub use random::{Randomness, ThreadRandomness};
pub use sender::{ConfirmationOutcome, TransactionSender};

#[cfg(test)]
pub use random::MockRandomness;
