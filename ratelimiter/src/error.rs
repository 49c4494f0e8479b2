use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_requests must be greater than 0")]
    ZeroMaxRequests,

    #[error("window must be greater than 0")]
    ZeroWindow,

    #[error("default_cooldown ({cooldown:?}) must exceed window ({window:?})")]
    CooldownTooShort {
        cooldown: std::time::Duration,
        window: std::time::Duration,
    },
}

/// Outcome of a call made through [`crate::guarded_call`] that did not succeed.
#[derive(Error, Debug)]
pub enum GuardedError<E> {
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error("{0}")]
    Failed(E),
}

impl<E> GuardedError<E> {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GuardedError::RateLimitExceeded)
    }
}
