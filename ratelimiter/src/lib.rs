mod config;
mod error;
mod governor;
mod guarded;

pub use config::GovernorConfig;
pub use error::{ConfigError, GuardedError};
pub use governor::{spawn_sweeper, Admission, RateGovernor, RequestRecord, Status};
pub use guarded::{guarded_call, QuotaSignal};

use lazy_static::lazy_static;
use std::sync::Arc;

lazy_static! {
    static ref GOVERNOR: Arc<RateGovernor> = Arc::new(RateGovernor::new(GovernorConfig::default()));
}

/// The process-wide governor, built from [`GovernorConfig::default`] on first use.
pub fn global() -> Arc<RateGovernor> {
    Arc::clone(&GOVERNOR)
}
