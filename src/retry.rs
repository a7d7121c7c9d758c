//! Retry logic with exponential backoff
//!
//! This module provides configurable retry logic for transient failures.
//! It implements exponential backoff with jitter to prevent thundering herd
//! against the rate-limited remote check service.
//!
//! # Example
//!
//! ```no_run
//! use content_check::retry::{IsTransient, run_with_retry};
//! use content_check::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! # impl std::fmt::Display for MyError {
//! #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//! #         write!(f, "{:?}", self)
//! #     }
//! # }
//! impl IsTransient for MyError {
//!     fn is_transient(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::remote_defaults();
//! let result = run_with_retry(&config, "submit_check", || async {
//!     // Your operation here
//!     Ok::<_, MyError>(())
//! }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as transient or not
///
/// Transient failures (network timeouts, connection resets, rate-limit
/// responses, 5xx server responses) should return `true`.
/// Permanent failures (authentication failed, malformed request, missing
/// file) should return `false`.
pub trait IsTransient {
    /// Returns true if the error is transient and the operation should be retried
    fn is_transient(&self) -> bool;
}

/// Implementation of IsTransient for our Error type
impl IsTransient for Error {
    fn is_transient(&self) -> bool {
        match self {
            // Network errors are retryable when they are timeouts or
            // connection-level failures
            Error::Network(e) => e.is_timeout() || e.is_connect(),
            // The remote service asked us to back off
            Error::RateLimited(_) => true,
            // 5xx responses are presumed temporary server trouble
            Error::Server { .. } => true,
            // I/O errors can be retryable in some cases
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            // Auth failures are permanent until credentials change
            Error::Auth(_) => false,
            // Non-5xx remote errors mean the request itself is bad
            Error::Remote { .. } => false,
            // Oversized files stay oversized
            Error::FileTooLarge { .. } => false,
            // Config errors are permanent
            Error::Config { .. } => false,
            // Serialization errors are permanent
            Error::Serialization(_) => false,
            // Folder watch errors are file system issues, not retryable
            Error::Watch(_) => false,
            // Unknown errors - be conservative and don't retry
            Error::Other(_) => false,
        }
    }
}

/// Execute an async operation with exponential backoff retry logic
///
/// The operation is attempted up to `config.max_retries + 1` times total
/// (attempt 0 is the first try, not a retry). Only errors classified as
/// transient by [`IsTransient`] are retried; permanent errors and exhausted
/// retries propagate the last error to the caller, which decides whether
/// that aborts a whole batch or is recorded as a single-item failure.
///
/// # Arguments
///
/// * `config` - Retry configuration (max retries, delays, backoff multiplier, jitter)
/// * `operation_name` - Name used in trace events for this operation
/// * `operation` - Async closure that returns Result<T, E> where E implements IsTransient
pub async fn run_with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsTransient + std::fmt::Display,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(e) if e.is_transient() && attempt < config.max_retries => {
                let delay = backoff_delay(config, attempt);
                attempt += 1;

                tracing::warn!(
                    operation = operation_name,
                    error = %e,
                    attempt = attempt,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis(),
                    "Transient failure, retrying after backoff"
                );

                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::error!(
                        operation = operation_name,
                        error = %e,
                        attempts = attempt + 1,
                        "Operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::error!(
                        operation = operation_name,
                        error = %e,
                        attempts = attempt + 1,
                        "Operation failed with non-transient error"
                    );
                }
                return Err(e);
            }
        }
    }
}

/// Compute the backoff delay for a given 0-based attempt number
///
/// The deterministic part is `min(max_delay, base_delay * multiplier^attempt)`.
/// When jitter is enabled, a uniform random amount in [0, 10%] of the capped
/// delay is added on top. The cap is applied before jitter, so the final
/// delay can sit up to 10% above `max_delay`; this keeps the cap meaningful
/// for the deterministic schedule while still de-synchronizing clients.
fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exponential = config.base_delay.as_secs_f64() * config.backoff_multiplier.powi(attempt as i32);
    let capped = exponential.min(config.max_delay.as_secs_f64());

    let jittered = if config.jitter {
        let mut rng = rand::thread_rng();
        let jitter_factor: f64 = rng.gen_range(0.0..=0.1);
        capped * (1.0 + jitter_factor)
    } else {
        capped
    };

    Duration::from_secs_f64(jittered)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    enum TestError {
        Transient,
        Permanent,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                TestError::Transient => write!(f, "transient error"),
                TestError::Permanent => write!(f, "permanent error"),
            }
        }
    }

    impl IsTransient for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[tokio::test]
    async fn success_on_first_attempt_calls_operation_once() {
        let config = RetryConfig::remote_defaults();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = run_with_retry(&config, "test_op", || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TestError>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "should only call once");
    }

    #[tokio::test]
    async fn transient_failures_then_success_returns_after_k_plus_one_attempts() {
        let config = fast_config(3);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = run_with_retry(&config, "test_op", || {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(TestError::Transient)
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(
            counter.load(Ordering::SeqCst),
            3,
            "2 transient failures then success = 3 attempts"
        );
    }

    #[tokio::test]
    async fn always_transient_fails_after_max_retries_plus_one_attempts() {
        let config = fast_config(2);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = run_with_retry(&config, "test_op", || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(
            counter.load(Ordering::SeqCst),
            3,
            "initial attempt + 2 retries = 3 attempts"
        );
    }

    #[tokio::test]
    async fn permanent_error_fails_after_exactly_one_attempt() {
        let config = RetryConfig::remote_defaults();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = run_with_retry(&config, "test_op", || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Permanent)
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(
            counter.load(Ordering::SeqCst),
            1,
            "should not retry permanent error"
        );
    }

    #[tokio::test]
    async fn zero_max_retries_fails_on_first_transient_error() {
        let config = fast_config(0);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = run_with_retry(&config, "test_op", || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        assert!(matches!(result, Err(TestError::Transient)));
        assert_eq!(
            counter.load(Ordering::SeqCst),
            1,
            "max_retries=0 means exactly one attempt"
        );
    }

    #[tokio::test]
    async fn backoff_delays_grow_exponentially_between_attempts() {
        let config = RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: false,
        };

        let timestamps = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let ts_clone = timestamps.clone();

        let _result = run_with_retry(&config, "test_op", || {
            let ts = ts_clone.clone();
            async move {
                ts.lock().await.push(std::time::Instant::now());
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        let ts = timestamps.lock().await;
        assert_eq!(ts.len(), 4, "initial + 3 retries = 4 attempts");

        // Gaps: ~50ms, ~100ms, ~200ms
        let gap1 = ts[1].duration_since(ts[0]);
        let gap2 = ts[2].duration_since(ts[1]);
        let gap3 = ts[3].duration_since(ts[2]);

        assert!(
            gap1 >= Duration::from_millis(40),
            "first delay should be ~50ms, was {:?}",
            gap1
        );
        assert!(
            gap2 >= Duration::from_millis(80),
            "second delay should be ~100ms, was {:?}",
            gap2
        );
        assert!(
            gap3 >= Duration::from_millis(160),
            "third delay should be ~200ms, was {:?}",
            gap3
        );
    }

    #[tokio::test]
    async fn backoff_delays_are_capped_at_max_delay() {
        // Without capping, delays would be 50ms, 500ms, 5000ms
        // With max_delay=200ms: 50ms, 200ms, 200ms
        let config = RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(200),
            backoff_multiplier: 10.0,
            jitter: false,
        };

        let timestamps = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let ts_clone = timestamps.clone();

        let _result = run_with_retry(&config, "test_op", || {
            let ts = ts_clone.clone();
            async move {
                ts.lock().await.push(std::time::Instant::now());
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        let ts = timestamps.lock().await;
        assert_eq!(ts.len(), 4, "initial + 3 retries = 4 attempts");

        // Generous tolerance for scheduling overhead
        let max_allowed = Duration::from_millis(350);
        for i in 1..ts.len() {
            let gap = ts[i].duration_since(ts[i - 1]);
            assert!(
                gap <= max_allowed,
                "delay before attempt {} was {:?}, exceeds max_delay (200ms) + tolerance",
                i + 1,
                gap
            );
        }
    }

    #[test]
    fn backoff_delay_without_jitter_is_deterministic() {
        let config = RetryConfig {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: false,
        };

        assert_eq!(backoff_delay(&config, 0), Duration::from_secs(1));
        assert_eq!(backoff_delay(&config, 1), Duration::from_secs(2));
        assert_eq!(backoff_delay(&config, 2), Duration::from_secs(4));
        assert_eq!(backoff_delay(&config, 3), Duration::from_secs(8));
        // 2^5 = 32s exceeds the 30s cap
        assert_eq!(backoff_delay(&config, 5), Duration::from_secs(30));
    }

    #[test]
    fn jitter_adds_at_most_ten_percent_over_many_iterations() {
        let config = RetryConfig {
            max_retries: 1,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        };

        let base = Duration::from_millis(100);
        let upper = Duration::from_millis(110);
        for i in 0..200 {
            let delay = backoff_delay(&config, 0);
            assert!(
                delay >= base,
                "iteration {i}: jittered {delay:?} < base delay {base:?}"
            );
            assert!(
                delay <= upper,
                "iteration {i}: jittered {delay:?} > base + 10% ({upper:?})"
            );
        }
    }

    #[test]
    fn jitter_is_applied_after_the_cap() {
        // Exponential part (1000s) far exceeds the 2s cap. With cap-then-jitter
        // the result lands in [2s, 2.2s]; jitter-then-cap would pin it at 2s.
        let config = RetryConfig {
            max_retries: 1,
            base_delay: Duration::from_secs(1000),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            jitter: true,
        };

        for _ in 0..200 {
            let delay = backoff_delay(&config, 3);
            assert!(delay >= Duration::from_secs(2));
            assert!(delay <= Duration::from_secs_f64(2.2));
        }
    }

    // -----------------------------------------------------------------------
    // IsTransient classification for Error variants
    // -----------------------------------------------------------------------

    #[test]
    fn rate_limited_is_transient() {
        assert!(Error::RateLimited("try again later".into()).is_transient());
    }

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Server {
            status: 503,
            message: "maintenance".into(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn io_timeout_and_connection_errors_are_transient() {
        for kind in [
            std::io::ErrorKind::TimedOut,
            std::io::ErrorKind::ConnectionRefused,
            std::io::ErrorKind::ConnectionReset,
            std::io::ErrorKind::ConnectionAborted,
            std::io::ErrorKind::NotConnected,
            std::io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::Interrupted,
        ] {
            let err = Error::Io(std::io::Error::new(kind, "boom"));
            assert!(err.is_transient(), "{kind:?} should be transient");
        }
    }

    #[test]
    fn io_not_found_is_not_transient() {
        let err = Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing file",
        ));
        assert!(
            !err.is_transient(),
            "a missing file will not appear by retrying"
        );
    }

    #[test]
    fn auth_failure_is_not_transient() {
        assert!(!Error::Auth("bad token".into()).is_transient());
    }

    #[test]
    fn non_5xx_remote_errors_are_not_transient() {
        let err = Error::Remote {
            status: 422,
            message: "unsupported content format".into(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn permanent_variants_are_not_transient() {
        assert!(
            !Error::Config {
                message: "bad config".into(),
                key: None,
            }
            .is_transient()
        );
        assert!(
            !Error::FileTooLarge {
                path: std::path::PathBuf::from("big.xml"),
                size: 10,
                limit: 1,
            }
            .is_transient()
        );
        assert!(!Error::Watch("inotify error".into()).is_transient());
        assert!(!Error::Other("unknown".into()).is_transient());
        assert!(
            !Error::Serialization(serde_json::from_str::<String>("bad json").unwrap_err())
                .is_transient()
        );
    }
}
