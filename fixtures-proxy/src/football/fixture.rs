use chrono::{DateTime, Utc};
use serde::Serialize;

use super::models::{Match, MatchStatus};

#[derive(Debug, Clone, Serialize)]
pub struct Fixture {
    pub id: u64,
    pub competition: String,
    pub kickoff: DateTime<Utc>,
    pub status: MatchStatus,
    pub matchday: Option<u32>,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
}

impl Fixture {
    pub fn from_match(competition: &str, m: Match) -> Fixture {
        Fixture {
            id: m.id,
            competition: competition.to_owned(),
            kickoff: m.utc_date,
            status: m.status,
            matchday: m.matchday,
            home_team: m.home_team.display_name(),
            away_team: m.away_team.display_name(),
            home_score: m.score.full_time.home,
            away_score: m.score.full_time.away,
        }
    }
}
