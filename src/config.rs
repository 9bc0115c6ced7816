use crate::error::ScrapeError;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    pub urls: Urls,
    pub credentials: Credentials,
    pub scraping_parameters: ScrapingParameters,
    pub polling_settings: PollingSettings,
    pub output: Output,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_seconds: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Urls {
    pub login: String,
    pub report: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrapingParameters {
    /// Overall start date, `YYYY-MM-DD`
    pub start_date: String,
    /// Overall end date, `YYYY-MM-DD`
    pub end_date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingSettings {
    pub timeout_seconds: u64,
    pub interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Output {
    pub directory: String,
}

fn default_user_agent() -> String {
    "ESB-Scraper/1.0".to_string()
}

fn default_rate_limit() -> f64 {
    5.0
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ScrapeError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ScrapeError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;

        let config: Config = serde_yaml::from_str(&contents).map_err(|e| {
            ScrapeError::Config(format!("invalid config {}: {}", path.display(), e))
        })?;

        if !config.rate_limit_seconds.is_finite() || config.rate_limit_seconds < 0.0 {
            return Err(ScrapeError::Config(format!(
                "rate_limit_seconds must be non-negative, got {}",
                config.rate_limit_seconds
            )));
        }

        Ok(config)
    }
}
