use std::str::FromStr;

use sentry::types::{Dsn, ParseDsnError};
use sentry::ClientInitGuard;
use sentry_tracing::EventFilter;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::Config;

/// Installs the tracing subscriber, forwarding warnings and errors to Sentry when a DSN is set.
/// The returned guard flushes pending Sentry events when dropped.
pub fn init(config: &Config) -> Result<ClientInitGuard, ParseDsnError> {
    let dsn = config.sentry_dsn.as_deref().map(Dsn::from_str).transpose()?;

    let guard = sentry::init(sentry::ClientOptions {
        dsn,
        debug: config.debug_mode,
        release: sentry::release_name!(),
        ..Default::default()
    });

    let sentry_layer = sentry_tracing::layer().event_filter(|meta| match *meta.level() {
        Level::ERROR | Level::WARN => EventFilter::Exception,
        _ => EventFilter::Ignore,
    });

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter).with(sentry_layer);

    if config.json_log {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }

    Ok(guard)
}
