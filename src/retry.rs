//! Retry with doubling backoff.
//!
//! Two callers with different budgets use this:
//!
//! - GitHub calls get four attempts with 2s, 4s and 8s pauses, and only
//!   transient failures are repeated.
//! - Text generation gets `n` attempts with 1s, 2s, 4s... pauses. Its errors
//!   all report themselves as retriable.
//!
//! Whether a failure is worth repeating is the error's call, via [`Retriable`].

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

pub trait Retriable {
    fn is_retriable(&self) -> bool;
}

/// How many times to call, and how long to pause between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Calls in total, first one included. Never below one.
    pub attempts: u32,
    /// Pause after the first failure. Each later pause is twice the previous.
    pub first_delay: Duration,
    /// Upper bound on any single pause.
    pub max_delay: Duration,
}

impl RetryConfig {
    pub const GITHUB: Self = Self {
        attempts: 4,
        first_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(16),
    };

    pub const fn new(attempts: u32, first_delay: Duration, max_delay: Duration) -> Self {
        let attempts = if attempts == 0 { 1 } else { attempts };
        Self {
            attempts,
            first_delay,
            max_delay,
        }
    }

    /// `attempts` calls with a `2^n` second pause after failed call `n`
    /// (0-based) and none after the last. The pauses are not capped.
    pub const fn powers_of_two(attempts: u32) -> Self {
        Self::new(attempts, Duration::from_secs(1), Duration::MAX)
    }

    /// Pause after failed call `failure` (0-based).
    pub fn pause_after(&self, failure: u32) -> Duration {
        2u32.checked_pow(failure)
            .and_then(|factor| self.first_delay.checked_mul(factor))
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Every pause a fully failing run sleeps through, in order.
    pub fn pauses(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.attempts.saturating_sub(1)).map(|n| self.pause_after(n))
    }
}

#[derive(Debug)]
pub enum RetryResult<T, E> {
    Success(T),
    /// Every allowed call failed with a retriable error.
    ExhaustedRetries { last_error: E, attempts: u32 },
    /// Stopped at the first error that retrying cannot fix.
    PermanentError(E),
}

impl<T, E> RetryResult<T, E> {
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Success(v) => Ok(v),
            Self::ExhaustedRetries { last_error: e, .. } | Self::PermanentError(e) => Err(e),
        }
    }
}

/// Calls `operation` until it succeeds, fails permanently, or runs out of
/// attempts.
pub async fn retry_with_backoff<T, E, F, Fut>(
    config: RetryConfig,
    mut operation: F,
) -> RetryResult<T, E>
where
    E: Retriable + Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let allowed = config.attempts.max(1);

    let mut made = 0;
    loop {
        let error = match operation().await {
            Ok(value) => return RetryResult::Success(value),
            Err(error) => error,
        };
        made += 1;

        if !error.is_retriable() {
            return RetryResult::PermanentError(error);
        }
        if made == allowed {
            return RetryResult::ExhaustedRetries {
                last_error: error,
                attempts: made,
            };
        }

        let pause = config.pause_after(made - 1);
        tracing::debug!(
            attempt = made,
            allowed,
            pause_ms = pause.as_millis() as u64,
            error = %error,
            "Call failed, backing off"
        );
        tokio::time::sleep(pause).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Debug, PartialEq)]
    enum Failure {
        Flaky(u8),
        Broken,
    }

    impl Display for Failure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Failure::Flaky(n) => write!(f, "flaky #{n}"),
                Failure::Broken => f.write_str("broken"),
            }
        }
    }

    impl Retriable for Failure {
        fn is_retriable(&self) -> bool {
            matches!(self, Failure::Flaky(_))
        }
    }

    /// Replays `outcomes` in order and records how many were consumed.
    async fn run(
        config: RetryConfig,
        outcomes: Vec<Result<&'static str, Failure>>,
    ) -> (RetryResult<&'static str, Failure>, usize) {
        let total = outcomes.len();
        let script = RefCell::new(VecDeque::from(outcomes));
        let result = retry_with_backoff(config, || {
            let next = script
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(Failure::Broken));
            async move { next }
        })
        .await;
        let left = script.borrow().len();
        (result, total - left)
    }

    #[test]
    fn github_pauses() {
        let pauses: Vec<_> = RetryConfig::GITHUB.pauses().map(|d| d.as_secs()).collect();
        assert_eq!(pauses, [2, 4, 8]);
        assert_eq!(RetryConfig::GITHUB.pauses().sum::<Duration>(), Duration::from_secs(14));
    }

    #[test]
    fn generation_pauses_follow_attempt_count() {
        let pauses: Vec<_> = RetryConfig::powers_of_two(3).pauses().map(|d| d.as_secs()).collect();
        assert_eq!(pauses, [1, 2]);
        assert_eq!(RetryConfig::powers_of_two(1).pauses().count(), 0);
        assert_eq!(RetryConfig::powers_of_two(0).attempts, 1);
    }

    #[test]
    fn generation_pauses_keep_doubling_past_a_minute() {
        let pauses: Vec<_> = RetryConfig::powers_of_two(10).pauses().map(|d| d.as_secs()).collect();
        assert_eq!(pauses, [1, 2, 4, 8, 16, 32, 64, 128, 256]);
        assert_eq!(
            RetryConfig::powers_of_two(13).pause_after(11),
            Duration::from_secs(2048)
        );
    }

    #[test]
    fn pause_is_capped() {
        let config = RetryConfig::new(40, Duration::from_secs(1), Duration::from_secs(10));
        assert_eq!(config.pause_after(3), Duration::from_secs(8));
        assert_eq!(config.pause_after(4), Duration::from_secs(10));
        assert_eq!(config.pause_after(39), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn first_success_is_returned() {
        let (result, calls) = run(RetryConfig::GITHUB, vec![Ok("done")]).await;
        assert!(matches!(result, RetryResult::Success("done")));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn permanent_failure_stops_immediately() {
        let (result, calls) = run(
            RetryConfig::GITHUB,
            vec![Err(Failure::Broken), Ok("unreached")],
        )
        .await;
        assert!(matches!(result, RetryResult::PermanentError(Failure::Broken)));
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn flaky_calls_recover_after_backoff() {
        let started = tokio::time::Instant::now();
        let (result, calls) = run(
            RetryConfig::powers_of_two(3),
            vec![Err(Failure::Flaky(1)), Err(Failure::Flaky(2)), Ok("third time")],
        )
        .await;

        assert_eq!(result.into_result(), Ok("third time"));
        assert_eq!(calls, 3);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_keeps_the_last_error() {
        let outcomes = (1..=4).map(|n| Err(Failure::Flaky(n))).collect();
        let (result, calls) = run(RetryConfig::GITHUB, outcomes).await;

        match result {
            RetryResult::ExhaustedRetries { last_error, attempts } => {
                assert_eq!(last_error, Failure::Flaky(4));
                assert_eq!(attempts, 4);
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(calls, 4);
    }

    proptest! {
        #[test]
        fn pauses_never_shrink_or_exceed_cap(
            first_ms in 1u64..1000,
            cap_ms in 1000u64..60_000,
            attempts in 1u32..40,
        ) {
            let config = RetryConfig::new(
                attempts,
                Duration::from_millis(first_ms),
                Duration::from_millis(cap_ms),
            );
            let pauses: Vec<_> = config.pauses().collect();
            prop_assert_eq!(pauses.len() as u32, attempts - 1);
            for pair in pauses.windows(2) {
                prop_assert!(pair[1] >= pair[0]);
            }
            prop_assert!(pauses.iter().all(|p| *p <= Duration::from_millis(cap_ms)));
        }
    }
}
