use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::{GuardedError, RateGovernor};

/// Lets [`guarded_call`] tell a remote "too many requests" response apart from other failures.
pub trait QuotaSignal {
    fn is_quota_exceeded(&self) -> bool;

    /// Retry hint sent by the remote side, if any. Only used for logging.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Waits for admission, records the attempt against `endpoint` and runs `work`.
///
/// A quota-exceeded failure puts the governor into its default cooldown and is returned as
/// [`GuardedError::RateLimitExceeded`]. Nothing is retried here.
pub async fn guarded_call<T, E, F>(
    governor: &RateGovernor,
    endpoint: &str,
    work: F,
) -> Result<T, GuardedError<E>>
where
    F: Future<Output = Result<T, E>>,
    E: QuotaSignal,
{
    governor.wait_for_slot().await.record(endpoint);

    match work.await {
        Ok(res) => Ok(res),
        Err(e) if e.is_quota_exceeded() => {
            warn!(endpoint, retry_after = ?e.retry_after(), "Request was rate limited");
            governor.report_limit_hit(None);
            Err(GuardedError::RateLimitExceeded)
        }
        Err(e) => Err(GuardedError::Failed(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GovernorConfig;
    use tokio::time::{self, Instant};

    #[derive(Debug, PartialEq)]
    enum TestError {
        TooManyRequests,
        NotFound,
    }

    impl QuotaSignal for TestError {
        fn is_quota_exceeded(&self) -> bool {
            *self == TestError::TooManyRequests
        }

        fn retry_after(&self) -> Option<Duration> {
            match self {
                TestError::TooManyRequests => Some(Duration::from_secs(5)),
                TestError::NotFound => None,
            }
        }
    }

    fn governor() -> RateGovernor {
        let config =
            GovernorConfig::new(3, Duration::from_secs(60), Duration::from_secs(65)).unwrap();
        RateGovernor::new(config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_is_recorded() {
        let governor = governor();

        let res = guarded_call(&governor, "teams", async { Ok::<_, TestError>(42) }).await;

        assert_eq!(res.unwrap(), 42);
        assert_eq!(governor.endpoint_stats()["teams"], 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_exceeded_starts_default_cooldown() {
        let governor = governor();

        let res: Result<(), _> =
            guarded_call(&governor, "teams", async { Err(TestError::TooManyRequests) }).await;

        assert!(res.unwrap_err().is_rate_limited());
        assert!(governor.status().blocked);
        assert_eq!(governor.endpoint_stats()["teams"], 1);

        // the server hint is not used for the cooldown
        time::advance(Duration::from_secs(6)).await;
        assert!(!governor.check_admission());
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_failures_pass_through() {
        let governor = governor();

        let res: Result<(), _> =
            guarded_call(&governor, "teams", async { Err(TestError::NotFound) }).await;

        match res {
            Err(GuardedError::Failed(e)) => assert_eq!(e, TestError::NotFound),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!governor.status().blocked);
        assert!(governor.check_admission());
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_call_waits_out_cooldown() {
        let governor = governor();
        let _: Result<(), _> =
            guarded_call(&governor, "teams", async { Err(TestError::TooManyRequests) }).await;

        let start = Instant::now();
        let res = guarded_call(&governor, "teams", async { Ok::<_, TestError>(()) }).await;

        assert!(res.is_ok());
        assert!(Instant::now() - start >= Duration::from_secs(65));
    }
}
