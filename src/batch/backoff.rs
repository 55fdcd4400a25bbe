//! Retry delay: a uniformly random value in `[min, max)`, with no growth
//! between attempts. The delay and the randomness are both injectable so the
//! retry loop can be driven without a real clock.

use crate::config::types::BackoffConfig;
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Suspends the caller for a delay.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// `tokio::time::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Draws a delay from `[min, max)`.
pub trait Jitter: Send + Sync {
    fn sample(&self, min: Duration, max: Duration) -> Duration;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomJitter;

impl Jitter for RandomJitter {
    fn sample(&self, min: Duration, max: Duration) -> Duration {
        if min >= max {
            return min;
        }
        rand::thread_rng().gen_range(min..max)
    }
}

#[derive(Clone)]
pub struct Backoff {
    min: Duration,
    max: Duration,
    jitter: Arc<dyn Jitter>,
}

impl std::fmt::Debug for Backoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backoff")
            .field("min", &self.min)
            .field("max", &self.max)
            .finish()
    }
}

impl Backoff {
    pub fn new(min: Duration, max: Duration, jitter: Arc<dyn Jitter>) -> Self {
        Self { min, max, jitter }
    }

    pub fn from_config(config: &BackoffConfig) -> Self {
        Self::new(config.min, config.max, Arc::new(RandomJitter))
    }

    pub fn with_jitter(mut self, jitter: Arc<dyn Jitter>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn window(&self) -> (Duration, Duration) {
        (self.min, self.max)
    }

    /// Delay before the next retry. Never exponential: every attempt draws
    /// from the same window.
    pub fn next_delay(&self) -> Duration {
        self.jitter.sample(self.min, self.max)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_config(&BackoffConfig::default())
    }
}
