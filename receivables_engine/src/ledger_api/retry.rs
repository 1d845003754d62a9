//! Bounded retries with exponential backoff.
//!
//! Only [`LedgerError::ConcurrencyConflict`] is retried. Every unit of work in the ledger is atomic, so a conflicted
//! attempt has left no trace and can simply be run again from scratch.
use std::{future::Future, time::Duration};

use log::*;

use crate::traits::LedgerError;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(25),
            max_delay: Duration::from_millis(1_000),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// `initial_delay * multiplier ^ attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.min(i32::MAX as usize) as i32);
        let nanos = self.initial_delay.as_nanos() as f64 * factor;
        if !nanos.is_finite() || nanos >= self.max_delay.as_nanos() as f64 {
            self.max_delay
        } else {
            Duration::from_nanos(nanos as u64)
        }
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the retries are used up.
    pub async fn run<T, F, Fut>(&self, name: &str, mut op: F) -> Result<T, LedgerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.delay_for_attempt(attempt);
                    attempt += 1;
                    warn!("🔄️ {name} hit a conflict ({e}). Retry {attempt}/{} in {delay:?}", self.max_retries);
                    tokio::time::sleep(delay).await;
                },
                Err(e) if e.is_retryable() => {
                    error!("🔄️ {name} still conflicted after {attempt} retries. Giving up. {e}");
                    return Err(e);
                },
                result => return result,
            }
        }
    }
}
