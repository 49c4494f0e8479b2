use std::time::Duration;

use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct Config {
    pub football_api_token: String,
    #[serde(default = "default_api_url")]
    pub football_api_url: String,
    #[serde(default = "default_competitions")]
    pub competitions: Vec<String>,
    #[serde(default = "default_days_ahead")]
    pub days_ahead: u32,
    // seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    pub server_addr: String,
    pub sentry_dsn: Option<String>,
    #[serde(default)]
    pub debug_mode: bool,
    #[serde(default)]
    pub json_log: bool,
}

impl Config {
    pub fn new() -> Result<Config, envy::Error> {
        envy::from_env::<Config>()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }
}

fn default_api_url() -> String {
    "https://api.football-data.org/v4".to_owned()
}

fn default_competitions() -> Vec<String> {
    vec!["PL".to_owned()]
}

fn default_days_ahead() -> u32 {
    14
}

fn default_poll_interval() -> u64 {
    120
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = envy::from_iter::<_, Config>(vars(&[
            ("FOOTBALL_API_TOKEN", "token"),
            ("SERVER_ADDR", "0.0.0.0:8080"),
        ]))
        .unwrap();

        assert_eq!(config.football_api_url, "https://api.football-data.org/v4");
        assert_eq!(config.competitions, vec!["PL"]);
        assert_eq!(config.days_ahead, 14);
        assert_eq!(config.poll_interval(), Duration::from_secs(120));
        assert!(config.sentry_dsn.is_none());
        assert!(!config.json_log);
    }

    #[test]
    fn test_competition_list() {
        let config = envy::from_iter::<_, Config>(vars(&[
            ("FOOTBALL_API_TOKEN", "token"),
            ("SERVER_ADDR", "0.0.0.0:8080"),
            ("COMPETITIONS", "PL,BL1,SA"),
            ("POLL_INTERVAL", "300"),
        ]))
        .unwrap();

        assert_eq!(config.competitions, vec!["PL", "BL1", "SA"]);
        assert_eq!(config.poll_interval(), Duration::from_secs(300));
    }

    #[test]
    fn test_token_required() {
        let res = envy::from_iter::<_, Config>(vars(&[("SERVER_ADDR", "0.0.0.0:8080")]));
        assert!(res.is_err());
    }
}
