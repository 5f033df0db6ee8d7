//! Run orchestration
//!
//! A run:
//! 1. Sends a random fraction of the balance to the deposit contract
//! 2. Pauses for a random interval
//! 3. Approves the deposit contract and deposits, with consecutive nonces

pub mod engine;
pub mod state;

pub use engine::RunEngine;
