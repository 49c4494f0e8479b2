use std::collections::HashMap;

use chrono::{Duration, Utc};
use futures::future::try_join_all;
use tracing::debug;

use super::{Fixture, FootballClient};
use crate::{Error, Result};

pub struct Poller {
    client: FootballClient,
    competitions: Vec<String>,
    days_ahead: u32,
}

impl Poller {
    pub fn new(client: FootballClient, competitions: Vec<String>, days_ahead: u32) -> Poller {
        Poller {
            client,
            competitions,
            days_ahead,
        }
    }

    /// Fetches upcoming fixtures for every competition, keyed by competition code. All requests
    /// are issued at once and queue on the governor when the quota is exhausted.
    pub async fn poll(&self) -> Result<HashMap<String, Vec<Fixture>>> {
        let from = Utc::now().date_naive();
        let to = from + Duration::days(i64::from(self.days_ahead));

        let requests = self.competitions.iter().map(|competition| async move {
            let res = self.client.competition_matches(competition, from, to).await?;

            let mut fixtures: Vec<Fixture> = res
                .matches
                .into_iter()
                .map(|m| Fixture::from_match(competition, m))
                .collect();
            fixtures.sort_by_key(|fixture| fixture.kickoff);

            debug!(%competition, count = fixtures.len(), "Fetched fixtures");
            Ok::<_, Error>((competition.clone(), fixtures))
        });

        Ok(try_join_all(requests).await?.into_iter().collect())
    }
}
