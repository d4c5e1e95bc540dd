// src/config.rs
// =============================================================================
// Runtime settings for the crawler and the breach checker.
//
// Every field has a default, so the config file is optional and may contain
// only the values you want to change:
//
//   {
//     "crawl": { "workers": 4, "calendar_patterns": ["(?i)/agenda/\\d{4}"] },
//     "breach": { "concurrency": 2 }
//   }
//
// CLI flags are applied on top of whatever the file says (see main.rs).
// =============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, TryFromFloatSecsError};

use crate::email::SKIP_TYPES;

/// Browser-like agent; some hosts refuse unknown clients on the landing page.
pub const DEFAULT_CRAWL_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:12.0) Gecko/20100101 Firefox/12.0";

// Recurring-event generators emit an endless chain of dated pages
pub const DEFAULT_CALENDAR_PATTERNS: [&str; 2] = [
    r"(?i)(calendar|events).*(/[0-9]{4}(/|-)[W]?[0-9]{1,2}|[0-9]{1,2}(/|-)[0-9]{1,2}(/|-)[0-9]{4}/|(exact_date|time_limit)~[0-9]{8,12})",
    r"(?i)(calendar|events).*(/action~|month/[0-9]{6})",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub crawl: CrawlConfig,
    pub breach: BreachConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub user_agent: String,
    pub seed_timeout_secs: u64,
    pub page_timeout_secs: u64,
    /// Body text that marks a plain-http landing page as unusable
    pub failure_marker: String,
    /// Errors tolerated before the budget check kicks in
    pub error_floor: u32,
    /// Share of visited links that may fail before the crawl stops
    pub error_ratio: f64,
    pub skip_types: Vec<String>,
    pub calendar_patterns: Vec<String>,
    /// Pending links fetched concurrently per round
    pub workers: usize,
    /// FIFO traversal instead of an unordered work set
    pub ordered: bool,
}

impl CrawlConfig {
    pub fn seed_timeout(&self) -> Duration {
        Duration::from_secs(self.seed_timeout_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_CRAWL_USER_AGENT.to_string(),
            seed_timeout_secs: 5,
            page_timeout_secs: 5,
            failure_marker: "FailureMode".to_string(),
            error_floor: 3,
            error_ratio: 0.9,
            skip_types: SKIP_TYPES.iter().map(|s| s.to_string()).collect(),
            calendar_patterns: DEFAULT_CALENDAR_PATTERNS.iter().map(|s| s.to_string()).collect(),
            workers: 1,
            ordered: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreachConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub initial_sleep_secs: f64,
    /// A Retry-After above this is treated as "come back tomorrow"
    pub max_retry_after_secs: f64,
    /// Addresses checked at the same time by the CLI
    pub concurrency: usize,
}

impl BreachConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    // Rejects negative, NaN, infinite and out-of-range seconds
    pub fn initial_sleep(&self) -> Result<Duration, TryFromFloatSecsError> {
        Duration::try_from_secs_f64(self.initial_sleep_secs)
    }

    pub fn max_retry_after(&self) -> Result<Duration, TryFromFloatSecsError> {
        Duration::try_from_secs_f64(self.max_retry_after_secs)
    }

    pub fn validate(&self) -> Result<()> {
        self.initial_sleep().with_context(|| {
            format!("breach.initial_sleep_secs = {} is not a usable wait", self.initial_sleep_secs)
        })?;
        self.max_retry_after().with_context(|| {
            format!(
                "breach.max_retry_after_secs = {} is not a usable wait",
                self.max_retry_after_secs
            )
        })?;
        Ok(())
    }
}

impl Default for BreachConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://haveibeenpwned.com".to_string(),
            user_agent: "pwn_check".to_string(),
            timeout_secs: 2,
            max_attempts: 2,
            initial_sleep_secs: 1.7,
            max_retry_after_secs: 80_000.0,
            concurrency: 1,
        }
    }
}

// Loads the config from a JSON file, or returns defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: AppConfig = serde_json::from_str(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    config
        .breach
        .validate()
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.crawl.page_timeout(), Duration::from_secs(5));
        assert_eq!(config.crawl.error_floor, 3);
        assert_eq!(config.crawl.skip_types.len(), 12);
        assert_eq!(config.breach.max_attempts, 2);
        assert_eq!(config.breach.initial_sleep().unwrap(), Duration::from_secs_f64(1.7));
        assert_eq!(config.breach.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "crawl": { "workers": 4 }, "breach": { "concurrency": 3 } }"#)
                .unwrap();
        assert_eq!(config.crawl.workers, 4);
        assert_eq!(config.crawl.failure_marker, "FailureMode");
        assert_eq!(config.crawl.calendar_patterns.len(), 2);
        assert_eq!(config.breach.concurrency, 3);
        assert_eq!(config.breach.user_agent, "pwn_check");
    }

    #[test]
    fn test_missing_path_gives_defaults() {
        let config = load_config(None).unwrap();
        assert!(!config.crawl.ordered);
    }

    fn breach_with(initial_sleep_secs: f64, max_retry_after_secs: f64) -> BreachConfig {
        BreachConfig {
            initial_sleep_secs,
            max_retry_after_secs,
            ..BreachConfig::default()
        }
    }

    #[test]
    fn test_negative_initial_sleep_rejected() {
        let err = breach_with(-1.0, 80_000.0).validate().unwrap_err();
        assert!(err.to_string().contains("initial_sleep_secs"));
    }

    #[test]
    fn test_non_finite_initial_sleep_rejected() {
        assert!(breach_with(f64::NAN, 80_000.0).validate().is_err());
        assert!(breach_with(f64::INFINITY, 80_000.0).validate().is_err());
    }

    #[test]
    fn test_oversized_retry_after_limit_rejected() {
        let err = breach_with(1.7, 1e20).validate().unwrap_err();
        assert!(err.to_string().contains("max_retry_after_secs"));
        assert!(breach_with(1.7, -5.0).validate().is_err());
    }

    #[test]
    fn test_load_config_rejects_negative_sleep() {
        let path = std::env::temp_dir().join(format!("mail-harvest-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "breach": { "initial_sleep_secs": -1.0 } }"#).unwrap();

        let result = load_config(Some(&path));
        std::fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("initial_sleep_secs"));
    }
}
