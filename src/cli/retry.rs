//! Caller-side retry of extractions
//!
//! The library never retries; the binary wraps its calls in a
//! [`RetryExecutor`], which only repeats network failures.

use crate::error::RytexError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Backoff multiplier
    pub backoff_multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

/// Retry executor
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or runs out of retries
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, RytexError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RytexError>>,
    {
        let mut delay = self.config.initial_delay;
        let mut attempt = 0;

        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !error.is_retryable() || attempt >= self.config.max_retries {
                return Err(error);
            }
            attempt += 1;

            let pause = delay + self.jitter(delay);
            warn!(
                "Attempt {} failed: {}; retrying in {}",
                attempt,
                error,
                humantime::format_duration(pause)
            );
            tokio::time::sleep(pause).await;

            delay = Duration::from_millis(
                (delay.as_millis() as f64 * self.config.backoff_multiplier) as u64,
            )
            .min(self.config.max_delay);
        }
    }

    fn jitter(&self, delay: Duration) -> Duration {
        if self.config.jitter_factor <= 0.0 {
            return Duration::ZERO;
        }
        let range = delay.as_millis() as f64 * self.config.jitter_factor;
        let jitter = (rand::random::<f64>() - 0.5) * 2.0 * range;
        Duration::from_millis(jitter.abs() as u64)
    }
}

/// Retry configuration builder
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn initial_delay(mut self, initial_delay: Duration) -> Self {
        self.config.initial_delay = initial_delay;
        self
    }

    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.config.max_delay = max_delay;
        self
    }

    pub fn backoff_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.config.backoff_multiplier = backoff_multiplier;
        self
    }

    pub fn jitter_factor(mut self, jitter_factor: f64) -> Self {
        self.config.jitter_factor = jitter_factor.clamp(0.0, 1.0);
        self
    }

    pub fn build(self) -> RetryConfig {
        self.config
    }
}
