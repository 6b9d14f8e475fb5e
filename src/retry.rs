//! Exponential backoff with jitter, bounded by a wall-clock budget.

use log::{debug, warn};
use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};

/// Total time spent retrying before the last error is returned.
pub const DEFAULT_MAX_ELAPSED: Duration = Duration::from_secs(5);

/// Randomness added to each computed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jitter {
    None,
    /// Adds a uniformly random extra delay in `[0, max]`.
    Additive(Duration),
    /// Replaces the delay with a uniformly random value in `[0, delay]`.
    Full,
}

/// How long to wait between attempts and when to give up.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay before the first retry, before jitter.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub factor: f64,
    /// Upper bound of a single delay, before jitter.
    pub max_delay: Duration,
    /// Retrying stops once this much time has passed since the first attempt.
    pub max_elapsed: Duration,
    pub jitter: Jitter,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            factor: 2.0,
            max_delay: Duration::from_secs(60),
            max_elapsed: DEFAULT_MAX_ELAPSED,
            jitter: Jitter::Additive(Duration::from_secs(1)),
        }
    }
}

impl BackoffPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_elapsed: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `attempt` (0-indexed), jitter included.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_millis() as f64
            * self.factor.powi(attempt.min(i32::MAX as u32) as i32);
        let capped = base.min(self.max_delay.as_millis() as f64).max(0.0);

        let final_ms = match self.jitter {
            Jitter::None => capped,
            Jitter::Additive(max) => {
                let max_ms = max.as_millis() as f64;
                capped + rand::thread_rng().gen_range(0.0..=max_ms)
            }
            Jitter::Full => rand::thread_rng().gen_range(0.0..=capped),
        };

        Duration::from_millis(final_ms as u64)
    }
}

/// Runs `operation` until it succeeds, fails with an error `is_transient`
/// rejects, or the policy's time budget runs out.
///
/// The last sleep is cut short so it never extends past the budget, which
/// bounds the total time by `max_elapsed` plus one in-flight attempt.
pub async fn with_backoff<F, Fut, T, E, P>(
    operation_name: &str,
    policy: &BackoffPolicy,
    mut operation: F,
    is_transient: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let start = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        let e = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if !is_transient(&e) {
            debug!("{}: non-retryable error: {}", operation_name, e);
            return Err(e);
        }

        let elapsed = start.elapsed();
        if elapsed >= policy.max_elapsed {
            warn!(
                "{}: giving up after {} attempt(s) in {:?}: {}",
                operation_name,
                attempt + 1,
                elapsed,
                e
            );
            return Err(e);
        }

        let delay = policy
            .delay_for_attempt(attempt)
            .min(policy.max_elapsed - elapsed);
        attempt += 1;
        warn!(
            "{}: attempt {} failed ({}), retrying in {}ms...",
            operation_name,
            attempt,
            e,
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;
    }
}
