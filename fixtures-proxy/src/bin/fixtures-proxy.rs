use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use fixtures_proxy::football::{FootballClient, Poller};
use fixtures_proxy::http::{self, FixtureMap, LastPollTime};
use fixtures_proxy::{telemetry, Config, Error, Result};
use parking_lot::RwLock;
use ratelimiter::{spawn_sweeper, RateGovernor};
use tokio::time::sleep;

use tracing::{error, info, warn};

const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
pub async fn main() -> Result<()> {
    let config = Config::new().expect("Failed to load config from environment variables");

    let _guard = telemetry::init(&config).expect("Invalid Sentry DSN");

    let governor = ratelimiter::global();
    spawn_sweeper(Arc::clone(&governor), SWEEP_INTERVAL);

    let client = FootballClient::new(&config, Arc::clone(&governor))?;
    let poller = Poller::new(client, config.competitions.clone(), config.days_ahead);

    let fixtures: FixtureMap = Arc::new(RwLock::new(HashMap::new()));
    let last_poll_time: LastPollTime = Arc::new(RwLock::new(None));

    start_server(
        &config,
        Arc::clone(&fixtures),
        Arc::clone(&last_poll_time),
        governor,
    );

    loop {
        info!("Polling");
        match poller.poll().await {
            Ok(data) => {
                let count: usize = data.values().map(Vec::len).sum();
                info!(count, competitions = data.len(), "Poll successful");

                *fixtures.write() = data;
                *last_poll_time.write() = Some(Utc::now());
            }
            Err(Error::RateLimitExceeded) => {
                warn!("Football data rate limit hit, retrying on next poll")
            }
            Err(e) => error!(error = %e, "An error occurred whilst polling football data"),
        };

        sleep(config.poll_interval()).await;
    }
}

fn start_server(
    config: &Config,
    fixtures: FixtureMap,
    last_poll_time: LastPollTime,
    governor: Arc<RateGovernor>,
) {
    let server_addr = config.server_addr.clone();

    tokio::spawn(async move {
        info!(%server_addr, "Starting server...");

        if let Err(e) = http::listen(&server_addr, fixtures, last_poll_time, governor).await {
            error!(error = %e, "Invalid server address");
        }
    });
}
