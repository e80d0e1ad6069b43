//! Fixed-delay retry policy shared by the catalog fetcher and holdings cache

use std::future::Future;
use std::time::Duration;

use crate::config::FetcherConfig;
use crate::errors::{ApiError, ErrorClass, FetchError};
use crate::logger::{self, LogTag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub rate_limit_pause: Duration,
    /// 429 pauses allowed before giving up; they do not spend `max_retries`
    pub max_rate_limit_pauses: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
            rate_limit_pause: config.rate_limit_pause(),
            max_rate_limit_pauses: config.max_rate_limit_pauses,
        }
    }

    /// Run `op` until it succeeds or the policy gives up
    ///
    /// Returns `Ok(None)` when the provider signalled end of data; callers
    /// decide what "empty" means for them.
    pub async fn execute<T, F, Fut>(
        &self,
        key: &str,
        tag: LogTag,
        mut op: F,
    ) -> Result<Option<T>, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempts: u32 = 0;
        let mut transient_failures: u32 = 0;
        let mut pauses: u32 = 0;

        loop {
            attempts += 1;
            let err = match op().await {
                Ok(value) => return Ok(Some(value)),
                Err(err) => err,
            };

            match err.class() {
                ErrorClass::EndOfData => {
                    logger::debug(tag, &format!("{}: end of data ({})", key, err));
                    return Ok(None);
                }
                ErrorClass::RateLimited => {
                    if pauses >= self.max_rate_limit_pauses {
                        logger::error(
                            tag,
                            &format!("{}: still rate limited after {} pauses", key, pauses),
                        );
                        return Err(FetchError::RateLimited {
                            key: key.to_string(),
                            pauses,
                        });
                    }
                    pauses += 1;
                    logger::warning(
                        tag,
                        &format!(
                            "{}: rate limited, pausing {:?} (pause {}/{})",
                            key, self.rate_limit_pause, pauses, self.max_rate_limit_pauses
                        ),
                    );
                    tokio::time::sleep(self.rate_limit_pause).await;
                }
                ErrorClass::Transient => {
                    transient_failures += 1;
                    if transient_failures > self.max_retries {
                        logger::error(
                            tag,
                            &format!("{}: giving up after {} attempts: {}", key, attempts, err),
                        );
                        return Err(FetchError::RetriesExhausted {
                            key: key.to_string(),
                            attempts,
                            source: err,
                        });
                    }
                    logger::warning(
                        tag,
                        &format!(
                            "{}: attempt {} failed ({}), retrying in {:?}",
                            key, attempts, err, self.retry_delay
                        ),
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                ErrorClass::Fatal => {
                    logger::error(tag, &format!("{}: non-retriable error: {}", key, err));
                    return Err(FetchError::NonRetriable {
                        key: key.to_string(),
                        source: err,
                    });
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetcherConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn status(code: u16) -> ApiError {
        ApiError::Status {
            endpoint: "/catalog".to_string(),
            status: code,
            body: None,
        }
    }

    /// Replays scripted results, then keeps answering Ok(1)
    struct Script {
        results: Mutex<VecDeque<Result<u32, ApiError>>>,
        calls: AtomicU32,
    }

    impl Script {
        fn new(results: Vec<Result<u32, ApiError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                calls: AtomicU32::new(0),
            }
        }

        async fn call(&self) -> Result<u32, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results.lock().pop_front().unwrap_or(Ok(1))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_retry_twice() {
        let script = Script::new(vec![Err(status(503)), Err(status(502))]);
        let started = tokio::time::Instant::now();

        let result = RetryPolicy::default()
            .execute("page:1", LogTag::Fetcher, || script.call())
            .await;

        assert_eq!(result, Ok(Some(1)));
        assert_eq!(script.calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted() {
        let script = Script::new(vec![Err(status(500)), Err(status(500)), Err(status(500))]);

        let result = RetryPolicy::default()
            .execute("page:4", LogTag::Fetcher, || script.call())
            .await;

        match result {
            Err(FetchError::RetriesExhausted { key, attempts, source }) => {
                assert_eq!(key, "page:4");
                assert_eq!(attempts, 3);
                assert_eq!(source.status(), Some(500));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_of_data_is_not_an_error() {
        let script = Script::new(vec![Err(status(422))]);
        let result = RetryPolicy::default()
            .execute("page:9", LogTag::Fetcher, || script.call())
            .await;
        assert_eq!(result, Ok(None));
        assert_eq!(script.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_does_not_spend_retry_budget() {
        let script = Script::new(vec![
            Err(status(503)),
            Err(status(429)),
            Err(status(429)),
            Err(status(503)),
        ]);
        let started = tokio::time::Instant::now();

        let result = RetryPolicy::default()
            .execute("page:2", LogTag::Fetcher, || script.call())
            .await;

        assert_eq!(result, Ok(Some(1)));
        assert_eq!(script.calls.load(Ordering::SeqCst), 5);
        // two 1s retry delays + two 2s rate limit pauses
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_pauses_are_bounded() {
        let policy = RetryPolicy {
            max_rate_limit_pauses: 2,
            ..RetryPolicy::default()
        };
        let script = Script::new(vec![Err(status(429)), Err(status(429)), Err(status(429))]);

        let result = policy.execute("page:2", LogTag::Fetcher, || script.call()).await;
        assert!(matches!(result, Err(FetchError::RateLimited { pauses: 2, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_stops_immediately() {
        let script = Script::new(vec![Err(status(404))]);
        let result = RetryPolicy::default()
            .execute("page:1", LogTag::Fetcher, || script.call())
            .await;
        assert!(matches!(result, Err(FetchError::NonRetriable { .. })));
        assert_eq!(script.calls.load(Ordering::SeqCst), 1);
    }
}
