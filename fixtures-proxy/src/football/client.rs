use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use ratelimiter::{guarded_call, RateGovernor};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

use super::models::MatchesResponse;
use crate::{Config, Error, Result};

const RETRY_HEADERS: [&str; 2] = ["retry-after", "x-requestcounter-reset"];

pub struct FootballClient {
    client: reqwest::Client,
    base_url: Url,
    token: String,
    governor: Arc<RateGovernor>,
}

impl FootballClient {
    pub fn new(config: &Config, governor: Arc<RateGovernor>) -> Result<FootballClient> {
        let client = reqwest::ClientBuilder::new()
            .use_rustls_tls()
            .timeout(Duration::from_secs(15))
            .build()?;

        // Url::join drops the last path segment unless it ends in a slash
        let mut base_url = Url::parse(&config.football_api_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Ok(FootballClient {
            client,
            base_url,
            token: config.football_api_token.clone(),
            governor,
        })
    }

    pub async fn competition_matches(
        &self,
        competition: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<MatchesResponse> {
        let endpoint = format!("competitions/{}/matches", competition);

        let mut url = self.base_url.join(&endpoint)?;
        url.query_pairs_mut()
            .append_pair("dateFrom", &from.format("%Y-%m-%d").to_string())
            .append_pair("dateTo", &to.format("%Y-%m-%d").to_string());

        Ok(guarded_call(&self.governor, &endpoint, self.get(url)).await?)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "Requesting football data");

        let res = self
            .client
            .get(url)
            .header("X-Auth-Token", &self.token)
            .send()
            .await?;

        let status = res.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Error::QuotaExceeded {
                retry_after: retry_after(res.headers()),
            }
            .into();
        }

        if !status.is_success() {
            return Error::FootballApiError(status).into();
        }

        let body = res.bytes().await?;
        match serde_json::from_slice(&body[..]) {
            Ok(v) => Ok(v),
            Err(e) => {
                error!(
                    error = %e,
                    body = ?std::str::from_utf8(&body[..]),
                    "Error deserialising football data response"
                );
                Err(e.into())
            }
        }
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    RETRY_HEADERS
        .iter()
        .find_map(|name| headers.get(*name)?.to_str().ok()?.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_retry_after_header() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("30"));
        headers.insert("x-requestcounter-reset", HeaderValue::from_static("12"));

        assert_eq!(retry_after(&headers), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_retry_after_falls_back_to_counter_reset() {
        let mut headers = HeaderMap::new();
        headers.insert("x-requestcounter-reset", HeaderValue::from_static(" 12 "));

        assert_eq!(retry_after(&headers), Some(Duration::from_secs(12)));
    }

    #[test]
    fn test_retry_after_ignores_http_dates() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "retry-after",
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );

        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn test_base_url_keeps_version_segment() {
        let config = Config {
            football_api_token: "token".to_owned(),
            football_api_url: "https://api.football-data.org/v4".to_owned(),
            competitions: vec!["PL".to_owned()],
            days_ahead: 14,
            poll_interval: 120,
            server_addr: "127.0.0.1:0".to_owned(),
            sentry_dsn: None,
            debug_mode: false,
            json_log: false,
        };

        let client = FootballClient::new(&config, ratelimiter::global()).unwrap();
        let url = client.base_url.join("competitions/PL/matches").unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.football-data.org/v4/competitions/PL/matches"
        );
    }
}
