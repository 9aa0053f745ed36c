//! Bounded retry with output validation.
//!
//! Replaces "call until the output looks valid" loops with an explicit
//! attempt budget and a validation predicate. Exhaustion is a typed failure,
//! never an infinite loop.

use std::future::Future;
use thiserror::Error;
use tracing::warn;

/// Failure after the attempt budget is spent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetryError {
    #[error("no valid output after {attempts} attempts")]
    Exhausted { attempts: usize },
}

/// A fixed attempt budget paired with a validation predicate at call time.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    attempts: usize,
}

impl RetryPolicy {
    /// `attempts` is clamped to at least 1.
    pub fn new(attempts: usize) -> Self {
        Self {
            attempts: attempts.max(1),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Run `op` until it yields an output accepted by `validate`, at most
    /// `attempts` times. Errors from `op` count as failed attempts.
    pub async fn run<T, F, Fut, V>(&self, mut op: F, validate: V) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
        V: Fn(&T) -> bool,
    {
        for attempt in 1..=self.attempts {
            match op().await {
                Ok(output) if validate(&output) => return Ok(output),
                Ok(_) => {
                    warn!("attempt {}/{} produced invalid output", attempt, self.attempts);
                }
                Err(e) => {
                    warn!("attempt {}/{} failed: {}", attempt, self.attempts, e);
                }
            }
        }
        Err(RetryError::Exhausted {
            attempts: self.attempts,
        })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2)
    }
}
