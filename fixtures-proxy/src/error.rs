use std::time::Duration;

use ratelimiter::{GuardedError, QuotaSignal};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Error while performing HTTP operation: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Error while operating on JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Error requesting football data. Status: {0}")]
    FootballApiError(reqwest::StatusCode),

    #[error("Football data quota exceeded (retry after {retry_after:?})")]
    QuotaExceeded { retry_after: Option<Duration> },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Error while parsing URL: {0}")]
    UrlParseError(#[from] url::ParseError),
}

impl<T> From<Error> for Result<T> {
    fn from(e: Error) -> Self {
        Err(e)
    }
}

impl QuotaSignal for Error {
    fn is_quota_exceeded(&self) -> bool {
        matches!(self, Error::QuotaExceeded { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::QuotaExceeded { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<GuardedError<Error>> for Error {
    fn from(e: GuardedError<Error>) -> Self {
        match e {
            GuardedError::RateLimitExceeded => Error::RateLimitExceeded,
            GuardedError::Failed(e) => e,
        }
    }
}
