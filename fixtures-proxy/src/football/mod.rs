mod client;
mod fixture;
mod models;
mod poller;

pub use client::FootballClient;
pub use fixture::Fixture;
pub use models::{MatchStatus, MatchesResponse};
pub use poller::Poller;
