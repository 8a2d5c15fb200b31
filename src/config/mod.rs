//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::fetch::RetryPolicy;
use crate::parse_duration;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Riot API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiotConfig {
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Regional host for account lookups
    #[serde(default = "default_account_base_url")]
    pub account_base_url: String,

    /// Platform host for league lookups
    #[serde(default = "default_platform_base_url")]
    pub platform_base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Pause between players in a scan
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    #[serde(default = "default_rate_limit_wait_secs")]
    pub rate_limit_wait_secs: u64,
}

fn default_api_key_env() -> String {
    "RIOT_API_KEY".to_string()
}

fn default_account_base_url() -> String {
    "https://europe.api.riotgames.com".to_string()
}

fn default_platform_base_url() -> String {
    "https://euw1.api.riotgames.com".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_request_delay_ms() -> u64 {
    200
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_rate_limit_wait_secs() -> u64 {
    60
}

impl Default for RiotConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            account_base_url: default_account_base_url(),
            platform_base_url: default_platform_base_url(),
            timeout_seconds: default_timeout(),
            request_delay_ms: default_request_delay_ms(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            rate_limit_wait_secs: default_rate_limit_wait_secs(),
        }
    }
}

impl RiotConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.retry_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
            rate_limit_wait: Duration::from_secs(self.rate_limit_wait_secs),
        }
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

/// Tracker schedule and reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSettings {
    /// Interval between runs in watch mode, e.g. "1h" or "30m"
    #[serde(default = "default_interval")]
    pub interval: String,

    /// How many movers the digest highlights
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Report first-seen (player, queue) pairs
    #[serde(default)]
    pub include_initial: bool,

    /// Top champion masteries fetched per player
    #[serde(default = "default_mastery_count")]
    pub mastery_count: u32,
}

fn default_interval() -> String {
    "1h".to_string()
}

fn default_top_n() -> usize {
    crate::calculate::DEFAULT_TOP_N
}

fn default_mastery_count() -> u32 {
    5
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            top_n: default_top_n(),
            include_initial: false,
            mastery_count: default_mastery_count(),
        }
    }
}

impl TrackerSettings {
    /// Parsed interval. Only valid after `AppConfig::validate`.
    pub fn interval(&self) -> Option<Duration> {
        parse_duration(&self.interval)
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub riot: RiotConfig,

    #[serde(default)]
    pub tracker: TrackerSettings,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            riot: RiotConfig::default(),
            tracker: TrackerSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise use defaults.
    pub fn load_or_default(path: &PathBuf) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.riot.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Riot timeout must be greater than 0".to_string(),
            ));
        }

        if self.riot.backoff_multiplier < 1.0 {
            return Err(ConfigError::ValidationError(
                "Backoff multiplier must be at least 1.0".to_string(),
            ));
        }

        for (name, value) in [
            ("account_base_url", &self.riot.account_base_url),
            ("platform_base_url", &self.riot.platform_base_url),
        ] {
            if url::Url::parse(value).is_err() {
                return Err(ConfigError::ValidationError(format!(
                    "riot.{} is not a valid URL: {}",
                    name, value
                )));
            }
        }

        match self.tracker.interval() {
            Some(d) if !d.is_zero() => {}
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid tracker interval: {}",
                    self.tracker.interval
                )))
            }
        }

        if self.tracker.top_n == 0 {
            return Err(ConfigError::ValidationError(
                "tracker.top_n must be greater than 0".to_string(),
            ));
        }

        if self.tracker.mastery_count == 0 {
            return Err(ConfigError::ValidationError(
                "tracker.mastery_count must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.riot.api_key_env, "RIOT_API_KEY");
        assert_eq!(config.riot.request_delay_ms, 200);
        assert_eq!(config.tracker.top_n, 5);
        assert!(!config.tracker.include_initial);
        assert_eq!(config.tracker.mastery_count, 5);
        assert_eq!(config.tracker.interval(), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_retry_policy_from_config() {
        let policy = RiotConfig::default().retry_policy();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(1000));
        assert_eq!(policy.rate_limit_wait, Duration::from_secs(60));
    }

    #[test]
    fn test_config_validation_ok() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_timeout() {
        let mut config = AppConfig::default();
        config.riot.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_interval() {
        let mut config = AppConfig::default();
        config.tracker.interval = "soon".to_string();
        assert!(config.validate().is_err());

        config.tracker.interval = "0s".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_mastery_count() {
        let mut config = AppConfig::default();
        config.tracker.mastery_count = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("mastery_count"));
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = AppConfig::default();
        config.riot.platform_base_url = "euw1".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("platform_base_url"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("elo-snitch.toml");
        std::fs::write(
            &path,
            "data_dir = \"/var/lib/elo\"\n\n[tracker]\ninterval = \"30m\"\ntop_n = 3\n",
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/elo"));
        assert_eq!(config.tracker.top_n, 3);
        assert_eq!(config.tracker.interval(), Some(Duration::from_secs(1800)));
        assert_eq!(config.riot.platform_base_url, "https://euw1.api.riotgames.com");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::load_or_default(&temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.tracker.interval, "1h");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
        assert_eq!(parsed.riot.max_retries, 3);
    }
}
