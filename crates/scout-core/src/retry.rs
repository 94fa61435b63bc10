//! Bounded retry with exponential backoff and jitter.
//!
//! The delay before retry `n` (1-based attempt that just failed) is
//! `base_delay * 2^(n-1) + uniform(0..=jitter_max)`. Only failures classified
//! [`ErrorClass::Transient`] are retried in place.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use crate::classifier::{classify, ErrorClass};
use crate::control::DispatchControl;
use crate::{DispatchError, ProviderError, Query, SearchProvider, SearchResult};

/// Retry constants for a single provider attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total calls allowed, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub jitter_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1_000),
            jitter_max: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Backoff before the retry that follows failed `attempt`, without jitter.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1_u32 << exponent)
    }
}

/// Source of backoff jitter.
pub trait Jitter: Send + Sync {
    /// Returns a duration in `0..=max`.
    fn sample(&self, max: Duration) -> Duration;
}

/// Uniform jitter from the thread-local `fastrand` generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl Jitter for RandomJitter {
    fn sample(&self, max: Duration) -> Duration {
        let max_ms = max.as_millis().min(u128::from(u64::MAX)) as u64;
        Duration::from_millis(fastrand::u64(0..=max_ms))
    }
}

/// Constant jitter, clamped to the policy maximum.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedJitter(pub Duration);

impl Jitter for FixedJitter {
    fn sample(&self, max: Duration) -> Duration {
        self.0.min(max)
    }
}

/// Reproducible jitter from a seeded generator.
#[derive(Debug)]
pub struct SeededJitter {
    rng: Mutex<fastrand::Rng>,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl Jitter for SeededJitter {
    fn sample(&self, max: Duration) -> Duration {
        let max_ms = max.as_millis().min(u128::from(u64::MAX)) as u64;
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Duration::from_millis(rng.u64(0..=max_ms))
    }
}

/// Suspends the calling flow between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep<'a>(&'a self, delay: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Sleeps on the tokio timer; other tasks keep running.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep<'a>(&'a self, delay: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(tokio::time::sleep(delay))
    }
}

/// Runs one provider call with bounded retries.
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    jitter: Arc<dyn Jitter>,
    sleeper: Arc<dyn Sleeper>,
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            jitter: Arc::new(RandomJitter),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_jitter(mut self, jitter: Arc<dyn Jitter>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Full delay (backoff plus jitter) before the retry that follows `attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.policy
            .backoff_delay(attempt)
            .saturating_add(self.jitter.sample(self.policy.jitter_max))
    }

    /// Calls `provider` up to the policy's `max_attempts` times.
    pub async fn run(
        &self,
        provider: &dyn SearchProvider,
        query: &Query,
        control: &DispatchControl,
    ) -> Result<SearchResult, DispatchError> {
        self.run_with_attempts(provider, query, self.policy.max_attempts, control)
            .await
    }

    /// Calls `provider` up to `max_attempts` times, overriding the policy.
    ///
    /// On success the result's `provider_id` is overwritten with the provider's own
    /// identity. A permanent failure, or a failure on the last attempt, is returned
    /// as [`DispatchError::Provider`] unchanged. Cancellation and deadline expiry
    /// surface as [`DispatchError::Cancelled`] / [`DispatchError::DeadlineExceeded`].
    pub async fn run_with_attempts(
        &self,
        provider: &dyn SearchProvider,
        query: &Query,
        max_attempts: u32,
        control: &DispatchControl,
    ) -> Result<SearchResult, DispatchError> {
        let provider_id = provider.id();

        for attempt in 1..=max_attempts {
            control.check()?;
            debug!(provider = %provider_id, attempt, max_attempts, "calling provider");

            let outcome = match control.remaining() {
                Some(remaining) => {
                    match tokio::time::timeout(remaining, provider.execute(query)).await {
                        Ok(outcome) => outcome,
                        Err(_) => return Err(control.deadline_exceeded()),
                    }
                }
                None => provider.execute(query).await,
            };

            let error = match outcome {
                Ok(mut result) => {
                    result.provider_id = provider_id;
                    return Ok(result);
                }
                Err(error) => error,
            };

            let class = classify(Some(&error));
            if class == ErrorClass::Permanent || attempt == max_attempts {
                debug!(
                    provider = %provider_id,
                    attempt,
                    ?class,
                    error = %error,
                    "provider attempt budget spent"
                );
                return Err(DispatchError::Provider(error));
            }

            let delay = self.delay_for_attempt(attempt);
            warn!(
                provider = %provider_id,
                attempt,
                delay_ms = delay.as_millis().min(u128::from(u64::MAX)) as u64,
                error = %error,
                "transient provider failure, backing off"
            );

            control.check()?;
            if let Some(remaining) = control.remaining() {
                if delay >= remaining {
                    return Err(control.deadline_exceeded());
                }
            }
            self.sleeper.sleep(delay).await;
        }

        Err(DispatchError::Provider(ProviderError::from_provider(
            provider_id,
            "Dispatch failed",
        )))
    }
}
