use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    /// Base URL of the backend's credential-issuing authority.
    pub authority_base_url: String,
    /// Cadence of the session liveness heartbeat, in seconds.
    pub heartbeat_interval_secs: u64,
    /// Window within which two sessions count as concurrently live, in seconds.
    pub recency_window_secs: u64,
    /// How long before credential expiry a silent renewal is requested, in seconds.
    pub renewal_margin_secs: u64,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/mentorly".to_string());

        let authority_base_url = env::var("MEDIA_AUTHORITY_URL")
            .unwrap_or_else(|_| "http://localhost:8080/api".to_string());

        let heartbeat_interval_secs = env::var("SESSION_HEARTBEAT_INTERVAL_SECS")
            .unwrap_or_else(|_| "120".to_string())
            .parse()
            .unwrap_or(120);

        let recency_window_secs = env::var("SESSION_RECENCY_WINDOW_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .unwrap_or(300);

        let renewal_margin_secs = env::var("MEDIA_RENEWAL_MARGIN_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .unwrap_or(300);

        Ok(Config {
            database_url,
            authority_base_url,
            heartbeat_interval_secs,
            recency_window_secs,
            renewal_margin_secs,
        })
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn recency_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.recency_window_secs as i64)
    }

    pub fn renewal_margin(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.renewal_margin_secs as i64)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "postgres://localhost/mentorly".to_string(),
            authority_base_url: "http://localhost:8080/api".to_string(),
            heartbeat_interval_secs: 120,
            recency_window_secs: 300,
            renewal_margin_secs: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cadences_match_design_values() {
        let config = Config::default();
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(120));
        assert_eq!(config.recency_window(), chrono::Duration::minutes(5));
        assert_eq!(config.renewal_margin(), chrono::Duration::minutes(5));
    }
}
