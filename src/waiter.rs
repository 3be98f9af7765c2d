//! Polling for a transaction receipt with a fixed, linearly growing schedule.

use std::time::Duration;

use crate::types::Receipt;

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1500);
pub const DEFAULT_DELAY_STEP: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Anything that can be asked for a transaction's receipt.
pub trait ReceiptSource {
    fn receipt(&self, tx_hash: &str) -> anyhow::Result<Option<Receipt>>;
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Delay before retry `attempt` is `base + attempt * step`; at most
/// `max_retries` retries follow the initial attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base: Duration,
    pub step: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_DELAY,
            step: DEFAULT_DELAY_STEP,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base + self.step * attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(move |attempt| self.delay(attempt))
    }
}

pub struct Waiter<S: Sleeper = ThreadSleeper> {
    policy: RetryPolicy,
    sleeper: S,
}

impl Waiter {
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
            sleeper: ThreadSleeper,
        }
    }
}

impl Default for Waiter {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sleeper> Waiter<S> {
    #[cfg(test)]
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> Waiter<T> {
        Waiter {
            policy: self.policy,
            sleeper,
        }
    }

    /// Returns `true` as soon as a receipt is present, `false` once the retry
    /// budget is spent. A failing lookup counts as "no receipt yet".
    pub fn confirm<C: ReceiptSource + ?Sized>(&self, client: &C, tx_hash: &str) -> bool {
        if self.lookup(client, tx_hash) {
            return true;
        }
        for (attempt, delay) in self.policy.delays().enumerate() {
            log::debug!(
                "no receipt for {} yet, retry {} in {:?}",
                tx_hash,
                attempt + 1,
                delay
            );
            self.sleeper.sleep(delay);
            if self.lookup(client, tx_hash) {
                return true;
            }
        }
        log::warn!(
            "no receipt for {} after {} attempts",
            tx_hash,
            self.policy.max_attempts()
        );
        false
    }

    fn lookup<C: ReceiptSource + ?Sized>(&self, client: &C, tx_hash: &str) -> bool {
        match client.receipt(tx_hash) {
            Ok(Some(receipt)) => {
                match receipt.table_id {
                    Some(table_id) => log::debug!(
                        "receipt for {} at block {} on chain {} (table {})",
                        receipt.tx_hash,
                        receipt.block_number,
                        receipt.chain_id,
                        table_id
                    ),
                    None => log::debug!(
                        "receipt for {} at block {} on chain {}",
                        receipt.tx_hash,
                        receipt.block_number,
                        receipt.chain_id
                    ),
                }
                true
            }
            Ok(None) => false,
            Err(e) => {
                log::debug!("receipt lookup for {} failed: {:#}", tx_hash, e);
                false
            }
        }
    }
}
