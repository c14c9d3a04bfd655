//! Configuration for the loot split service.
//!
//! Everything is overridable through `ORBSPLIT_*` environment variables
//! on top of defaults that match the calculator's original setup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

use crate::rates::PriceFeedConfig;
use crate::report::UnitNames;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Price feed configuration
    pub feed: FeedConfig,
    /// Display names for the two denominations
    pub units: UnitsConfig,
    /// Session persistence configuration
    pub session: SessionConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Primary price feed base URL
    pub base_url: String,
    /// Alternate base URLs tried in order when the primary fails
    pub mirrors: Vec<String>,
    /// League the prices are scoped to
    pub league: String,
    /// Feed identifier of the reference (minor) currency
    pub reference_currency: String,
    /// Feed identifier of the major currency
    pub major_currency: String,
    /// Per-attempt request timeout
    pub timeout_secs: u64,
    /// Fetch fresh rates once at startup
    pub refresh_on_start: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitsConfig {
    pub major_name: String,
    pub minor_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Path of the JSON session document
    pub data_path: String,
    /// Group name stamped on fresh sessions
    pub group_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8420,
            },
            feed: FeedConfig {
                base_url: "https://poe2scout.com/api/items/".to_string(),
                mirrors: Vec::new(),
                league: "Rise of the Abyssal".to_string(),
                reference_currency: "exalted".to_string(),
                major_currency: "divine".to_string(),
                timeout_secs: 10,
                refresh_on_start: true,
            },
            units: UnitsConfig {
                major_name: "Divine".to_string(),
                minor_name: "Exalted".to_string(),
            },
            session: SessionConfig {
                data_path: "data/session.json".to_string(),
                group_name: "Party".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables on top of defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = env::var("ORBSPLIT_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = env::var("ORBSPLIT_PORT") {
            config.server.port = port.parse().context("Invalid ORBSPLIT_PORT value")?;
        }

        if let Ok(base_url) = env::var("ORBSPLIT_FEED_BASE_URL") {
            config.feed.base_url = base_url;
        }
        if let Ok(mirrors) = env::var("ORBSPLIT_FEED_MIRRORS") {
            config.feed.mirrors = mirrors
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Ok(league) = env::var("ORBSPLIT_LEAGUE") {
            config.feed.league = league;
        }
        if let Ok(reference) = env::var("ORBSPLIT_REFERENCE_CURRENCY") {
            config.feed.reference_currency = reference;
        }
        if let Ok(major) = env::var("ORBSPLIT_MAJOR_CURRENCY") {
            config.feed.major_currency = major;
        }
        if let Ok(timeout) = env::var("ORBSPLIT_FEED_TIMEOUT_SECS") {
            config.feed.timeout_secs = timeout
                .parse()
                .context("Invalid ORBSPLIT_FEED_TIMEOUT_SECS value")?;
        }
        if let Ok(refresh) = env::var("ORBSPLIT_REFRESH_ON_START") {
            config.feed.refresh_on_start = refresh
                .parse()
                .context("Invalid ORBSPLIT_REFRESH_ON_START value")?;
        }

        if let Ok(name) = env::var("ORBSPLIT_MAJOR_NAME") {
            config.units.major_name = name;
        }
        if let Ok(name) = env::var("ORBSPLIT_MINOR_NAME") {
            config.units.minor_name = name;
        }

        if let Ok(path) = env::var("ORBSPLIT_DATA_PATH") {
            config.session.data_path = path;
        }
        if let Ok(group) = env::var("ORBSPLIT_GROUP_NAME") {
            config.session.group_name = group;
        }

        if let Ok(level) = env::var("ORBSPLIT_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for consistency.
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(anyhow::anyhow!("Server host cannot be empty"));
        }
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port must be non-zero"));
        }

        Url::parse(&self.feed.base_url)
            .with_context(|| format!("Invalid feed base URL: {}", self.feed.base_url))?;
        for mirror in &self.feed.mirrors {
            Url::parse(mirror).with_context(|| format!("Invalid feed mirror URL: {}", mirror))?;
        }
        if self.feed.league.is_empty() {
            return Err(anyhow::anyhow!("League cannot be empty"));
        }
        if self.feed.major_currency.is_empty() || self.feed.reference_currency.is_empty() {
            return Err(anyhow::anyhow!("Feed currency identifiers cannot be empty"));
        }
        if self.feed.major_currency == self.feed.reference_currency {
            return Err(anyhow::anyhow!(
                "Major and reference currency must differ, both are '{}'",
                self.feed.major_currency
            ));
        }
        if self.feed.timeout_secs == 0 {
            return Err(anyhow::anyhow!("Feed timeout must be non-zero"));
        }

        if self.units.major_name.is_empty() || self.units.minor_name.is_empty() {
            return Err(anyhow::anyhow!("Unit display names cannot be empty"));
        }
        if self.session.data_path.is_empty() {
            return Err(anyhow::anyhow!("Session data path cannot be empty"));
        }

        Ok(())
    }

    pub fn feed_config(&self) -> PriceFeedConfig {
        PriceFeedConfig {
            base_url: self.feed.base_url.clone(),
            mirrors: self.feed.mirrors.clone(),
            league: self.feed.league.clone(),
            reference_currency: self.feed.reference_currency.clone(),
            major_currency: self.feed.major_currency.clone(),
            timeout_secs: self.feed.timeout_secs,
            max_response_bytes: 1024 * 1024,
        }
    }

    pub fn unit_names(&self) -> UnitNames {
        UnitNames {
            major: self.units.major_name.clone(),
            minor: self.units.minor_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_feed_url() {
        let mut config = Config::default();
        config.feed.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_identical_currencies() {
        let mut config = Config::default();
        config.feed.major_currency = "exalted".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_feed_config_carries_chain() {
        let mut config = Config::default();
        config.feed.mirrors = vec!["https://mirror.example/api/".to_string()];

        let feed = config.feed_config();
        assert_eq!(feed.mirrors.len(), 1);
        assert_eq!(feed.league, "Rise of the Abyssal");
    }
}
