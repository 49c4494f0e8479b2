use crate::football::Fixture;

use std::collections::HashMap;
use std::net::{AddrParseError, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use ratelimiter::RateGovernor;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::time::Instant;
use warp::http::StatusCode;
use warp::reply::{self, Json, WithStatus};
use warp::Filter;

pub type FixtureMap = Arc<RwLock<HashMap<String, Vec<Fixture>>>>;
pub type LastPollTime = Arc<RwLock<Option<DateTime<Utc>>>>;

#[derive(Serialize, Debug)]
struct PingResponse {
    success: bool,
}

#[derive(Serialize, Debug)]
struct RateLimitResponse {
    current: usize,
    max: usize,
    remaining: usize,
    queued: usize,
    blocked: bool,
    reset_time: DateTime<Utc>,
    last_poll_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug)]
struct FixturesQuery {
    competition: Option<String>,
}

pub async fn listen(
    server_addr: &str,
    fixtures: FixtureMap,
    last_poll_time: LastPollTime,
    governor: Arc<RateGovernor>,
) -> Result<(), AddrParseError> {
    let addr = SocketAddr::from_str(server_addr)?;

    warp::serve(routes(fixtures, last_poll_time, governor))
        .run(addr)
        .await;

    Ok(())
}

pub fn routes(
    fixtures: FixtureMap,
    last_poll_time: LastPollTime,
    governor: Arc<RateGovernor>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let ping = warp::path!("ping").and_then(ping);

    let fixtures = warp::any().map(move || Arc::clone(&fixtures));
    let last_poll_time = warp::any().map(move || Arc::clone(&last_poll_time));
    let governor = warp::any().map(move || Arc::clone(&governor));

    let all_fixtures = warp::path!("fixtures")
        .and(fixtures)
        .and(warp::query::<FixturesQuery>())
        .and_then(get_fixtures);

    let ratelimit = warp::path!("ratelimit")
        .and(governor.clone())
        .and(last_poll_time)
        .and_then(ratelimit_status);

    let endpoints = warp::path!("ratelimit" / "endpoints")
        .and(governor)
        .and_then(endpoint_stats);

    warp::get().and(ping.or(all_fixtures).or(ratelimit).or(endpoints))
}

async fn ping() -> Result<Json, warp::Rejection> {
    Ok(reply::json(&PingResponse { success: true }))
}

async fn get_fixtures(
    fixtures: FixtureMap,
    query: FixturesQuery,
) -> Result<WithStatus<Json>, warp::Rejection> {
    let fixtures = fixtures.read();

    let competition = match query.competition {
        Some(competition) => competition,
        None => return Ok(reply::with_status(reply::json(&*fixtures), StatusCode::OK)),
    };

    match fixtures.get(&competition) {
        Some(fixtures) => Ok(reply::with_status(reply::json(fixtures), StatusCode::OK)),
        None => Ok(reply::with_status(
            reply::json(&json!({
                "error": format!("Unknown competition {}", competition)
            })),
            StatusCode::NOT_FOUND,
        )),
    }
}

async fn ratelimit_status(
    governor: Arc<RateGovernor>,
    last_poll_time: LastPollTime,
) -> Result<Json, warp::Rejection> {
    let status = governor.status();

    // Instant has no wall clock equivalent, so translate via the remaining duration
    let reset_in = status.reset_time.saturating_duration_since(Instant::now());
    let reset_time =
        Utc::now() + chrono::Duration::from_std(reset_in).unwrap_or_else(|_| chrono::Duration::zero());

    Ok(reply::json(&RateLimitResponse {
        current: status.current,
        max: status.max,
        remaining: status.remaining,
        queued: status.queued,
        blocked: status.blocked,
        reset_time,
        last_poll_time: *last_poll_time.read(),
    }))
}

async fn endpoint_stats(governor: Arc<RateGovernor>) -> Result<Json, warp::Rejection> {
    Ok(reply::json(&governor.endpoint_stats()))
}
