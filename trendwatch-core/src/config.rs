//! Runtime configuration.
//!
//! Settings come from an optional TOML file and are then overridden by
//! environment variables. Credentials are only ever read from the environment
//! (or a `.env` file) and are never printed.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_CONFIG_PATH: &str = "trendwatch.toml";
pub const ENV_CONFIG_PATH: &str = "TRENDWATCH_CONFIG";

/// One week; longer intervals are almost certainly a unit mistake.
pub const MAX_POLLING_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

pub const ENV_BEARER_TOKEN: &str = "TWITTER_BEARER_TOKEN";
pub const ENV_USER_ACCESS_TOKEN: &str = "TWITTER_USER_ACCESS_TOKEN";
pub const ENV_USER_ID: &str = "TWITTER_USER_ID";

#[derive(Clone, Default)]
pub struct Credentials {
    /// App-only token used for search.
    pub bearer_token: Option<String>,
    /// User-context token used for engagement actions.
    pub user_access_token: Option<String>,
    pub user_id: Option<String>,
}

impl Credentials {
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            bearer_token: read(ENV_BEARER_TOKEN),
            user_access_token: read(ENV_USER_ACCESS_TOKEN),
            user_id: read(ENV_USER_ID),
        }
    }

    pub fn engagement_enabled(&self) -> bool {
        self.user_access_token.is_some() && self.user_id.is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("bearer_token", &mask(&self.bearer_token))
            .field("user_access_token", &mask(&self.user_access_token))
            .field("user_id", &mask(&self.user_id))
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub keyword: String,
    pub trigger_keyword: String,
    pub language: String,
    pub max_results: u32,
    pub database_url: String,
    pub csv_path: PathBuf,
    pub safety_margin_secs: u64,
    pub max_rate_limit_retries: u32,
    pub max_total_wait_secs: u64,
    pub polling_interval_minutes: u64,
    pub api_base_url: String,
    #[serde(skip)]
    pub credentials: Credentials,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            keyword: "Swift".to_string(),
            trigger_keyword: "swift".to_string(),
            language: "en".to_string(),
            max_results: 20,
            database_url: "sqlite://sentiment.db".to_string(),
            csv_path: PathBuf::from("sentiment_report.csv"),
            safety_margin_secs: 5,
            max_rate_limit_retries: 3,
            max_total_wait_secs: 30 * 60,
            polling_interval_minutes: 60,
            api_base_url: "https://api.twitter.com".to_string(),
            credentials: Credentials::default(),
        }
    }
}

impl AppConfig {
    /// Load `.env`, the TOML file (if any) and environment overrides, then validate.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let (path, explicit) = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => (PathBuf::from(p), true),
            Err(_) => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else if explicit {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        } else {
            Self::default()
        };

        config.apply_env(&|key: &str| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply `TRENDWATCH_*` overrides and read credentials through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TRENDWATCH_KEYWORD") {
            self.keyword = v;
        }
        if let Some(v) = lookup("TRENDWATCH_TRIGGER_KEYWORD") {
            self.trigger_keyword = v;
        }
        if let Some(v) = lookup("TRENDWATCH_LANGUAGE") {
            self.language = v;
        }
        if let Some(v) = lookup("TRENDWATCH_MAX_RESULTS") {
            self.max_results = parse_number("TRENDWATCH_MAX_RESULTS", &v)?;
        }
        if let Some(v) = lookup("TRENDWATCH_DATABASE_URL") {
            self.database_url = v;
        }
        if let Some(v) = lookup("TRENDWATCH_CSV_PATH") {
            self.csv_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("TRENDWATCH_POLLING_INTERVAL_MINUTES") {
            self.polling_interval_minutes = parse_number("TRENDWATCH_POLLING_INTERVAL_MINUTES", &v)?;
        }
        if let Some(v) = lookup("TRENDWATCH_API_BASE_URL") {
            self.api_base_url = v;
        }

        self.credentials = Credentials::from_lookup(lookup);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keyword.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "keyword".to_string(),
            });
        }
        if self.trigger_keyword.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "trigger_keyword".to_string(),
            });
        }
        if self.max_results == 0 || self.max_results > 100 {
            return Err(ConfigError::InvalidValue {
                field: "max_results".to_string(),
                value: self.max_results.to_string(),
            });
        }
        if self.polling_interval_minutes == 0
            || self.polling_interval_minutes > MAX_POLLING_INTERVAL_MINUTES
        {
            return Err(ConfigError::InvalidValue {
                field: "polling_interval_minutes".to_string(),
                value: self.polling_interval_minutes.to_string(),
            });
        }
        Url::parse(&self.api_base_url).map_err(|e| ConfigError::InvalidValue {
            field: "api_base_url".to_string(),
            value: format!("{} ({})", self.api_base_url, e),
        })?;
        Ok(())
    }

    pub fn require_bearer_token(&self) -> Result<&str, ConfigError> {
        self.credentials
            .bearer_token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                var_name: ENV_BEARER_TOKEN.to_string(),
            })
    }

    pub fn safety_margin(&self) -> Duration {
        Duration::from_secs(self.safety_margin_secs)
    }

    pub fn max_total_wait(&self) -> Duration {
        Duration::from_secs(self.max_total_wait_secs)
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_minutes.saturating_mul(60))
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.keyword, "Swift");
        assert_eq!(config.max_results, 20);
        assert_eq!(config.safety_margin(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            keyword = "Rust"
            max_results = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.keyword, "Rust");
        assert_eq!(config.max_results, 50);
        assert_eq!(config.language, "en");
        assert_eq!(config.polling_interval_minutes, 60);
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = AppConfig::from_toml_str("keyword = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides_and_credentials() {
        let mut config = AppConfig::default();
        let lookup = lookup_from(&[
            ("TRENDWATCH_KEYWORD", "ferris"),
            ("TRENDWATCH_MAX_RESULTS", "40"),
            (ENV_BEARER_TOKEN, "app-token"),
            (ENV_USER_ACCESS_TOKEN, "user-token"),
            (ENV_USER_ID, "42"),
        ]);
        config.apply_env(&lookup).unwrap();

        assert_eq!(config.keyword, "ferris");
        assert_eq!(config.max_results, 40);
        assert_eq!(config.require_bearer_token().unwrap(), "app-token");
        assert!(config.credentials.engagement_enabled());
    }

    #[test]
    fn test_invalid_numeric_override() {
        let mut config = AppConfig::default();
        let lookup = lookup_from(&[("TRENDWATCH_MAX_RESULTS", "lots")]);
        let result = config.apply_env(&lookup);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_missing_bearer_token() {
        let config = AppConfig::default();
        assert!(matches!(
            config.require_bearer_token(),
            Err(ConfigError::MissingEnvironmentVariable { .. })
        ));
        assert!(!config.credentials.engagement_enabled());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.max_results = 500;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.api_base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.keyword = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn test_polling_interval_is_bounded() {
        let mut config = AppConfig::default();
        config.polling_interval_minutes = MAX_POLLING_INTERVAL_MINUTES;
        assert!(config.validate().is_ok());

        config.polling_interval_minutes = MAX_POLLING_INTERVAL_MINUTES + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "polling_interval_minutes"
        ));

        // Conversion never overflows, even for values validation would reject.
        config.polling_interval_minutes = u64::MAX;
        assert_eq!(config.polling_interval(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = Credentials {
            bearer_token: Some("super-secret".to_string()),
            user_access_token: None,
            user_id: None,
        };
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<set>"));
    }
}
