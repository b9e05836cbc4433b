//! Linode client configuration

use crate::error::{LinodeError, Result};
use std::time::Duration;

pub const DEFAULT_URL: &str = "https://api.linode.com";
pub const DEFAULT_API_VERSION: &str = "v4";

/// Connection settings for the Linode API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub token: String,
    /// API root without version, e.g. `https://api.linode.com`
    pub url: String,
    pub api_version: String,
    pub user_agent: String,
    pub retry: RetryConfig,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            url: DEFAULT_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            user_agent: default_user_agent(),
            retry: RetryConfig::default(),
        }
    }

    /// Create ClientConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("LINODE_TOKEN")
            .map_err(|_| LinodeError::MissingEnvVar("LINODE_TOKEN".to_string()))?;

        let mut config = Self::new(token);
        if let Ok(url) = std::env::var("LINODE_URL") {
            config.url = url;
        }
        if let Ok(version) = std::env::var("LINODE_API_VERSION") {
            config.api_version = version;
        }
        if let Ok(prefix) = std::env::var("LINODE_UA_PREFIX") {
            config.user_agent = format!("{} {}", prefix, config.user_agent);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(LinodeError::InvalidConfig("token must not be empty".to_string()));
        }
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(LinodeError::InvalidConfig(format!(
                "url must start with http:// or https://: {}",
                self.url
            )));
        }
        if self.api_version.trim().is_empty() || self.api_version.contains('/') {
            return Err(LinodeError::InvalidConfig(format!(
                "invalid api version: {:?}",
                self.api_version
            )));
        }
        self.retry.validate()
    }

    /// Versioned API root, e.g. `https://api.linode.com/v4`
    pub fn base_url(&self) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), self.api_version)
    }
}

fn default_user_agent() -> String {
    format!("cloudform/{}", env!("CARGO_PKG_VERSION"))
}

/// Retry configuration for transient API failures
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,

    /// Initial delay between retries
    pub initial_delay: Duration,

    /// Maximum delay between retries
    pub max_delay: Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// No retries at all
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(LinodeError::InvalidConfig(
                "retry max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(LinodeError::InvalidConfig(format!(
                "retry backoff_multiplier must be a finite number >= 1.0, got {}",
                self.backoff_multiplier
            )));
        }
        Ok(())
    }

    /// Delay before the attempt following `attempt` (1-based), capped at `max_delay`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        temp_env::with_vars(
            [
                ("LINODE_TOKEN", Some("secret")),
                ("LINODE_URL", None),
                ("LINODE_API_VERSION", None),
                ("LINODE_UA_PREFIX", None),
            ],
            || {
                let config = ClientConfig::from_env().unwrap();
                assert_eq!(config.token, "secret");
                assert_eq!(config.base_url(), "https://api.linode.com/v4");
                assert!(config.user_agent.starts_with("cloudform/"));
            },
        );
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        temp_env::with_vars(
            [
                ("LINODE_TOKEN", Some("secret")),
                ("LINODE_URL", Some("http://localhost:8080/")),
                ("LINODE_API_VERSION", Some("v4beta")),
                ("LINODE_UA_PREFIX", Some("ci-runner")),
            ],
            || {
                let config = ClientConfig::from_env().unwrap();
                assert_eq!(config.base_url(), "http://localhost:8080/v4beta");
                assert!(config.user_agent.starts_with("ci-runner cloudform/"));
            },
        );
    }

    #[test]
    #[serial]
    fn test_from_env_missing_token() {
        temp_env::with_var_unset("LINODE_TOKEN", || {
            let err = ClientConfig::from_env().unwrap_err();
            assert!(matches!(err, LinodeError::MissingEnvVar(name) if name == "LINODE_TOKEN"));
        });
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = ClientConfig::new("t").with_url("api.linode.com");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_backoff() {
        let retry = RetryConfig::default();
        assert_eq!(retry.delay_for(1), Duration::from_secs(1));
        assert_eq!(retry.delay_for(2), Duration::from_secs(2));
        assert_eq!(retry.delay_for(3), Duration::from_secs(4));
        assert_eq!(retry.delay_for(10), Duration::from_secs(30));
        assert_eq!(retry.delay_for(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn test_validate_rejects_bad_backoff() {
        let mut config = ClientConfig::new("t");
        config.retry.backoff_multiplier = -2.0;
        assert!(config.validate().is_err());

        config.retry.backoff_multiplier = f64::NAN;
        assert!(config.validate().is_err());

        config.retry.backoff_multiplier = 1.0;
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        config.retry.max_attempts = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backoff_never_panics() {
        let retry = RetryConfig {
            backoff_multiplier: -3.0,
            ..RetryConfig::default()
        };
        assert_eq!(retry.delay_for(2), Duration::from_secs(30));
    }
}
