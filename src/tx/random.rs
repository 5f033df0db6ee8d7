//! Randomness behind transfer amounts and run pacing

use rand::Rng;
use std::time::Duration;

/// Source of the two random choices a run makes
#[cfg_attr(test, mockall::automock)]
pub trait Randomness: Send + Sync {
    /// Uniform value in `[0, upper)`. `upper` is never zero.
    fn below(&self, upper: u128) -> u128;

    /// Uniform duration in `[min, max]`
    fn delay_between(&self, min: Duration, max: Duration) -> Duration;
}

/// Thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandomness;

impl Randomness for ThreadRandomness {
    fn below(&self, upper: u128) -> u128 {
        rand::thread_rng().gen_range(0..upper)
    }

    fn delay_between(&self, min: Duration, max: Duration) -> Duration {
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }
}
