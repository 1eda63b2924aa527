//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::fetch::{FetcherConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use crate::models::{MonthSpec, MonthSpecError, ScoreBasis};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid month: {0}")]
    MonthError(#[from] MonthSpecError),
}

/// Upstream API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sent on every request; the upstream refuses library defaults
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl UpstreamConfig {
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// One month as written in the config file: either an explicit gameweek
/// list or an inclusive `from`/`to` range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gameweeks: Option<Vec<u32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<u32>,
}

impl MonthConfig {
    pub fn to_month_spec(&self) -> Result<MonthSpec, ConfigError> {
        match (&self.gameweeks, self.from, self.to) {
            (Some(gameweeks), None, None) => Ok(MonthSpec::new(&self.name, gameweeks.iter().copied())),
            (None, Some(from), Some(to)) => Ok(MonthSpec::from_range(&self.name, from, to)?),
            _ => Err(ConfigError::ValidationError(format!(
                "month '{}' needs either `gameweeks` or both `from` and `to`",
                self.name
            ))),
        }
    }
}

/// Default league to compute when none is given on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeagueConfig {
    #[serde(default)]
    pub league_id: Option<u64>,

    #[serde(default)]
    pub basis: ScoreBasis,

    #[serde(default)]
    pub months: Vec<MonthConfig>,
}

impl LeagueConfig {
    pub fn month_specs(&self) -> Result<Vec<MonthSpec>, ConfigError> {
        self.months.iter().map(MonthConfig::to_month_spec).collect()
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub league: LeagueConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            upstream: UpstreamConfig::default(),
            server: ServerConfig::default(),
            league: LeagueConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Upstream timeout must be greater than 0".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.league.league_id == Some(0) {
            return Err(ConfigError::ValidationError(
                "League id must be greater than 0".to_string(),
            ));
        }

        self.league.month_specs()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.upstream.base_url, "https://fantasy.premierleague.com/api");
        assert_eq!(config.upstream.timeout_seconds, 30);
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.league.basis, ScoreBasis::Gross);
        assert!(config.league.months.is_empty());
    }

    #[test]
    fn test_fetcher_config_from_upstream() {
        let upstream = UpstreamConfig {
            timeout_seconds: 5,
            ..UpstreamConfig::default()
        };
        let fetcher = upstream.fetcher_config();

        assert_eq!(fetcher.timeout, Duration::from_secs(5));
        assert!(fetcher.user_agent.contains("Mozilla"));
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_timeout() {
        let mut config = AppConfig::default();
        config.upstream.timeout_seconds = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_league() {
        let mut config = AppConfig::default();
        config.league.league_id = Some(0);

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_month_config_forms() {
        let listed = MonthConfig {
            name: "Aug".to_string(),
            gameweeks: Some(vec![1, 2, 3]),
            from: None,
            to: None,
        };
        assert_eq!(listed.to_month_spec().unwrap(), MonthSpec::new("Aug", [1, 2, 3]));

        let ranged = MonthConfig {
            name: "Sep".to_string(),
            gameweeks: None,
            from: Some(4),
            to: Some(7),
        };
        assert_eq!(ranged.to_month_spec().unwrap(), MonthSpec::new("Sep", [4, 5, 6, 7]));

        let both = MonthConfig {
            name: "Oct".to_string(),
            gameweeks: Some(vec![8]),
            from: Some(8),
            to: Some(9),
        };
        assert!(matches!(
            both.to_month_spec(),
            Err(ConfigError::ValidationError(_))
        ));

        let inverted = MonthConfig {
            name: "Nov".to_string(),
            gameweeks: None,
            from: Some(12),
            to: Some(10),
        };
        assert!(matches!(
            inverted.to_month_spec(),
            Err(ConfigError::MonthError(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
log_level = "debug"

[upstream]
timeout_seconds = 10

[server]
port = 8088

[league]
league_id = 665400
basis = "net"

[[league.months]]
name = "Month 1"
from = 1
to = 4

[[league.months]]
name = "Month 2"
gameweeks = [5, 6, 7, 8]
"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.upstream.timeout_seconds, 10);
        assert_eq!(config.upstream.base_url, "https://fantasy.premierleague.com/api");
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.league.league_id, Some(665400));
        assert_eq!(config.league.basis, ScoreBasis::Net);

        let months = config.league.month_specs().unwrap();
        assert_eq!(months[0], MonthSpec::new("Month 1", [1, 2, 3, 4]));
        assert_eq!(months[1], MonthSpec::new("Month 2", [5, 6, 7, 8]));
    }

    #[test]
    fn test_from_file_rejects_bad_month() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[[league.months]]
name = "Broken"
from = 3
"#
        )
        .unwrap();

        assert!(AppConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.server.port, 3001);
    }

    #[test]
    fn test_config_serialization() {
        let mut config = AppConfig::default();
        config.league.months.push(MonthConfig {
            name: "Aug".to_string(),
            gameweeks: None,
            from: Some(1),
            to: Some(3),
        });
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.league.months.len(), 1);
    }
}
